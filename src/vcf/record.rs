use crate::utils::{Result, SvgtError};
use crate::vcf::{FieldDef, FieldType, Header};
use itertools::Itertools;
use std::collections::HashMap;
use std::fmt;

/// Value of one INFO entry; flag fields carry no value.
#[derive(Debug, Clone, PartialEq)]
pub enum InfoValue {
    Flag,
    Value(String),
}

/// Typed value of one per-sample FORMAT field. Values that do not parse as
/// their declared type are carried as text so the record stays lossless.
#[derive(Debug, Clone, PartialEq)]
pub enum GenotypeValue {
    Int(i64),
    Float(f64),
    Text(String),
    Missing,
}

impl GenotypeValue {
    fn from_field(raw: &str, def: &FieldDef) -> Self {
        if raw == "." {
            return GenotypeValue::Missing;
        }
        match def.ty {
            FieldType::Integer => raw
                .parse::<i64>()
                .map(GenotypeValue::Int)
                .unwrap_or_else(|_| GenotypeValue::Text(raw.to_string())),
            FieldType::Float => raw
                .parse::<f64>()
                .map(GenotypeValue::Float)
                .unwrap_or_else(|_| GenotypeValue::Text(raw.to_string())),
            _ => GenotypeValue::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for GenotypeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenotypeValue::Int(value) => write!(f, "{}", value),
            GenotypeValue::Float(value) => write!(f, "{:.2}", value),
            GenotypeValue::Text(value) => write!(f, "{}", value),
            GenotypeValue::Missing => write!(f, "."),
        }
    }
}

/// Per-sample FORMAT field values. Mutation goes through
/// [`Variant::set_genotype_field`], which validates ids against the header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Genotype {
    fields: HashMap<String, GenotypeValue>,
}

impl Genotype {
    pub fn get(&self, id: &str) -> Option<&GenotypeValue> {
        self.fields.get(id)
    }

    fn set(&mut self, id: &str, value: GenotypeValue) {
        self.fields.insert(id.to_string(), value);
    }
}

/// One data record. Every sample declared in the header has exactly one
/// `Genotype` entry, defaulted to `./.` when the source line is short.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub chrom: String,
    pub pos: u64,
    pub id: String,
    pub ref_allele: String,
    pub alt_allele: String,
    pub qual: f64,
    pub filter: String,
    info: Vec<(String, InfoValue)>,
    active_formats: Vec<String>,
    genotypes: HashMap<String, Genotype>,
}

impl Variant {
    /// Parses one tab-separated data line. Fewer than 8 columns is a fatal
    /// `Data` error; a missing format-keys column is treated as `GT`; sample
    /// columns that are absent entirely default to `./.`.
    pub fn from_line(line: &str, header: &Header) -> Result<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 8 {
            return Err(SvgtError::Data(format!(
                "Expected at least 8 columns, found {}: {}",
                fields.len(),
                line
            )));
        }

        let pos = fields[1]
            .parse::<u64>()
            .map_err(|_| SvgtError::Data(format!("Invalid position: {}", fields[1])))?;
        let qual = if fields[5] == "." {
            0.0
        } else {
            fields[5]
                .parse::<f64>()
                .map_err(|_| SvgtError::Data(format!("Invalid quality: {}", fields[5])))?
        };

        let mut variant = Self {
            chrom: fields[0].to_string(),
            pos,
            id: fields[2].to_string(),
            ref_allele: fields[3].to_string(),
            alt_allele: fields[4].to_string(),
            qual,
            filter: fields[6].to_string(),
            info: Vec::new(),
            active_formats: Vec::new(),
            genotypes: header
                .samples()
                .iter()
                .map(|sample| (sample.clone(), Genotype::default()))
                .collect(),
        };

        if fields[7] != "." {
            for entry in fields[7].split(';') {
                match entry.split_once('=') {
                    Some((id, value)) => {
                        variant.set_info(header, id, InfoValue::Value(value.to_string()))?
                    }
                    None => variant.set_info(header, entry, InfoValue::Flag)?,
                }
            }
        }

        let format_keys: Vec<&str> = match fields.get(8) {
            Some(column) => column.split(':').collect(),
            None => vec!["GT"],
        };
        for (index, sample) in header.samples().iter().enumerate() {
            match fields.get(9 + index) {
                Some(column) => {
                    for (key, raw) in format_keys.iter().zip(column.split(':')) {
                        let def = header.format(key).ok_or_else(|| {
                            SvgtError::Config(format!(
                                "FORMAT field not declared in the header: {}",
                                key
                            ))
                        })?;
                        let value = GenotypeValue::from_field(raw, def);
                        variant.set_genotype_field(header, sample, key, value)?;
                    }
                }
                None => variant.set_genotype_field(
                    header,
                    sample,
                    "GT",
                    GenotypeValue::Text("./.".to_string()),
                )?,
            }
        }

        Ok(variant)
    }

    pub fn info(&self, header: &Header, id: &str) -> Result<Option<&InfoValue>> {
        if header.info(id).is_none() {
            return Err(SvgtError::Config(format!(
                "INFO field not declared in the header: {}",
                id
            )));
        }
        Ok(self
            .info
            .iter()
            .find(|(entry_id, _)| entry_id == id)
            .map(|(_, value)| value))
    }

    pub fn set_info(&mut self, header: &Header, id: &str, value: InfoValue) -> Result<()> {
        if header.info(id).is_none() {
            return Err(SvgtError::Config(format!(
                "INFO field not declared in the header: {}",
                id
            )));
        }
        match self.info.iter_mut().find(|(entry_id, _)| entry_id == id) {
            Some((_, entry)) => *entry = value,
            None => self.info.push((id.to_string(), value)),
        }
        Ok(())
    }

    /// Sets one sample's FORMAT field after checking the id against the
    /// header declarations. First-time use of a field activates it for the
    /// whole record; the active list stays in header-declared order.
    pub fn set_genotype_field(
        &mut self,
        header: &Header,
        sample: &str,
        id: &str,
        value: GenotypeValue,
    ) -> Result<()> {
        if header.format(id).is_none() {
            return Err(SvgtError::Config(format!(
                "FORMAT field not declared in the header: {}",
                id
            )));
        }
        let genotype = self
            .genotypes
            .get_mut(sample)
            .ok_or_else(|| SvgtError::Config(format!("Unknown sample: {}", sample)))?;
        genotype.set(id, value);
        if !self.active_formats.iter().any(|active| active == id) {
            self.active_formats.push(id.to_string());
            self.active_formats
                .sort_by_key(|active| header.format_index(active).unwrap_or(usize::MAX));
        }
        Ok(())
    }

    pub fn genotype_field<'a>(
        &'a self,
        header: &Header,
        sample: &str,
        id: &str,
    ) -> Result<Option<&'a GenotypeValue>> {
        if header.format(id).is_none() {
            return Err(SvgtError::Config(format!(
                "FORMAT field not declared in the header: {}",
                id
            )));
        }
        Ok(self.genotypes.get(sample).and_then(|g| g.get(id)))
    }

    pub fn active_formats(&self) -> &[String] {
        &self.active_formats
    }

    /// Serializes the record back into a tab-separated line; only active
    /// FORMAT fields are emitted, with `.` for samples that lack a value.
    pub fn render(&self, header: &Header) -> String {
        let info = if self.info.is_empty() {
            ".".to_string()
        } else {
            self.info
                .iter()
                .map(|(id, value)| match value {
                    InfoValue::Flag => id.clone(),
                    InfoValue::Value(value) => format!("{}={}", id, value),
                })
                .join(";")
        };

        let mut columns = vec![
            self.chrom.clone(),
            self.pos.to_string(),
            self.id.clone(),
            self.ref_allele.clone(),
            self.alt_allele.clone(),
            format!("{:.2}", self.qual),
            self.filter.clone(),
            info,
        ];
        if !header.samples().is_empty() {
            columns.push(self.active_formats.iter().join(":"));
            for sample in header.samples() {
                let genotype = self.genotypes.get(sample);
                let rendered = self
                    .active_formats
                    .iter()
                    .map(|id| {
                        genotype
                            .and_then(|g| g.get(id))
                            .map(|value| value.to_string())
                            .unwrap_or_else(|| ".".to_string())
                    })
                    .join(":");
                columns.push(rendered);
            }
        }
        columns.join("\t")
    }
}
