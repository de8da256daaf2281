use crate::utils::{Result, SvgtError};
use itertools::Itertools;

/// Declared value type of an INFO or FORMAT field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    Float,
    Character,
    Str,
    Flag,
}

impl FieldType {
    fn from_tag(tag: &str) -> Self {
        match tag {
            "Integer" => FieldType::Integer,
            "Float" => FieldType::Float,
            "Character" => FieldType::Character,
            "Flag" => FieldType::Flag,
            _ => FieldType::Str,
        }
    }

    fn tag(&self) -> &'static str {
        match self {
            FieldType::Integer => "Integer",
            FieldType::Float => "Float",
            FieldType::Character => "Character",
            FieldType::Str => "String",
            FieldType::Flag => "Flag",
        }
    }
}

/// One INFO/ALT/FORMAT declaration: id, arity descriptor, value type and
/// free-text description.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub id: String,
    pub number: String,
    pub ty: FieldType,
    pub description: String,
}

impl FieldDef {
    pub fn new(
        id: impl Into<String>,
        number: impl Into<String>,
        ty: FieldType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            number: number.into(),
            ty,
            description: description.into(),
        }
    }

    fn from_meta(body: &str, directive: &str) -> Result<Self> {
        let mut id = None;
        let mut number = ".".to_string();
        let mut ty = FieldType::Str;
        let mut description = String::new();
        for (key, value) in split_meta(body) {
            match key.as_str() {
                "ID" => id = Some(value),
                "Number" => number = value,
                "Type" => ty = FieldType::from_tag(&value),
                "Description" => description = value,
                _ => {}
            }
        }
        let id = id.ok_or_else(|| {
            SvgtError::Config(format!("{} directive without an ID: <{}>", directive, body))
        })?;
        Ok(Self {
            id,
            number,
            ty,
            description,
        })
    }
}

/// Splits a `<...>` directive body on commas that are outside double quotes
/// and returns the `key=value` pairs with quotes stripped.
fn split_meta(body: &str) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    let mut entry = String::new();
    let mut in_quotes = false;
    for ch in body.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                entry.push(ch);
            }
            ',' if !in_quotes => {
                entries.push(std::mem::take(&mut entry));
            }
            _ => entry.push(ch),
        }
    }
    if !entry.is_empty() {
        entries.push(entry);
    }

    entries
        .iter()
        .filter_map(|entry| entry.split_once('='))
        .map(|(key, value)| (key.to_string(), value.trim_matches('"').to_string()))
        .collect()
}

/// The declared metadata of a VCF stream: file format, reference, the
/// ordered INFO/ALT/FORMAT definitions and the sample names.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub file_format: String,
    pub reference: String,
    infos: Vec<FieldDef>,
    alts: Vec<FieldDef>,
    formats: Vec<FieldDef>,
    samples: Vec<String>,
}

impl Default for Header {
    fn default() -> Self {
        Self::new()
    }
}

impl Header {
    pub fn new() -> Self {
        let mut header = Self {
            file_format: "VCFv4.2".to_string(),
            reference: String::new(),
            infos: Vec::new(),
            alts: Vec::new(),
            formats: Vec::new(),
            samples: Vec::new(),
        };
        header.add_format(FieldDef::new("GT", "1", FieldType::Str, "Genotype"));
        header
    }

    /// Builds a header from the leading `#`-prefixed lines of a stream.
    /// Unrecognized directives are ignored; the `#CHROM` row supplies the
    /// sample names.
    pub fn from_lines(lines: &[String]) -> Result<Self> {
        let mut header = Self::new();
        for line in lines {
            if let Some(rest) = line.strip_prefix("##fileformat=") {
                header.file_format = rest.to_string();
            } else if let Some(rest) = line.strip_prefix("##reference=") {
                header.reference = rest.to_string();
            } else if let Some(body) = directive_body(line, "##INFO=") {
                header.add_info(FieldDef::from_meta(body?, "INFO")?);
            } else if let Some(body) = directive_body(line, "##ALT=") {
                header.add_alt(FieldDef::from_meta(body?, "ALT")?);
            } else if let Some(body) = directive_body(line, "##FORMAT=") {
                header.add_format(FieldDef::from_meta(body?, "FORMAT")?);
            } else if line.starts_with("#CHROM") {
                header.samples = line.split('\t').skip(9).map(|s| s.to_string()).collect();
            }
        }
        Ok(header)
    }

    /// Field ids are unique per category; a redeclaration of an existing id
    /// is dropped (this is how the implicit `GT` entry wins over a `GT`
    /// declared by the input).
    pub fn add_info(&mut self, def: FieldDef) {
        if self.info(&def.id).is_none() {
            self.infos.push(def);
        }
    }

    pub fn add_alt(&mut self, def: FieldDef) {
        if self.alt(&def.id).is_none() {
            self.alts.push(def);
        }
    }

    pub fn add_format(&mut self, def: FieldDef) {
        if self.format(&def.id).is_none() {
            self.formats.push(def);
        }
    }

    pub fn info(&self, id: &str) -> Option<&FieldDef> {
        self.infos.iter().find(|def| def.id == id)
    }

    pub fn alt(&self, id: &str) -> Option<&FieldDef> {
        self.alts.iter().find(|def| def.id == id)
    }

    pub fn format(&self, id: &str) -> Option<&FieldDef> {
        self.formats.iter().find(|def| def.id == id)
    }

    /// Position of a FORMAT id in declaration order, used to keep a
    /// record's active-field list in header order.
    pub fn format_index(&self, id: &str) -> Option<usize> {
        self.formats.iter().position(|def| def.id == id)
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    /// Emits the canonical header block: fileformat, a fresh fileDate,
    /// reference, all declarations in first-declared order, then the column
    /// row.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("##fileformat={}\n", self.file_format));
        out.push_str(&format!(
            "##fileDate={}\n",
            chrono::Local::now().format("%Y%m%d")
        ));
        if !self.reference.is_empty() {
            out.push_str(&format!("##reference={}\n", self.reference));
        }
        for def in &self.infos {
            out.push_str(&format!(
                "##INFO=<ID={},Number={},Type={},Description=\"{}\">\n",
                def.id,
                def.number,
                def.ty.tag(),
                def.description
            ));
        }
        for def in &self.alts {
            out.push_str(&format!(
                "##ALT=<ID={},Description=\"{}\">\n",
                def.id, def.description
            ));
        }
        for def in &self.formats {
            out.push_str(&format!(
                "##FORMAT=<ID={},Number={},Type={},Description=\"{}\">\n",
                def.id,
                def.number,
                def.ty.tag(),
                def.description
            ));
        }
        let mut columns = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO".to_string();
        if !self.samples.is_empty() {
            columns.push_str("\tFORMAT\t");
            columns.push_str(&self.samples.iter().join("\t"));
        }
        out.push_str(&columns);
        out.push('\n');
        out
    }
}

fn directive_body<'a>(line: &'a str, prefix: &str) -> Option<Result<&'a str>> {
    let rest = line.strip_prefix(prefix)?;
    let body = rest
        .strip_prefix('<')
        .and_then(|rest| rest.strip_suffix('>'))
        .ok_or_else(|| SvgtError::Config(format!("Malformed header directive: {}", line)));
    Some(body)
}
