use crate::cli::Cli;
use crate::genotype::regenotype_variant;
use crate::utils::{create_reader, create_writer, Result, SvgtError};
use crate::vcf::{FieldDef, FieldType, Header, Variant};
use rand::{rngs::StdRng, SeedableRng};
use std::io::{BufRead, Write};

pub fn svgt(args: &Cli) -> Result<()> {
    let reader = create_reader(args.input.as_ref())?;
    let mut writer = create_writer(args.output.as_ref())?;
    process_stream(reader, &mut writer, args.seed)?;
    writer
        .flush()
        .map_err(|e| SvgtError::Io(format!("Failed to flush output: {}", e)))
}

/// The tool writes GT/GQ/SQ for every sample, so the output header must
/// declare them even when the input header does not.
fn prepare_output_header(header: &mut Header) {
    header.add_format(FieldDef::new(
        "GQ",
        "1",
        FieldType::Float,
        "Genotype quality",
    ));
    header.add_format(FieldDef::new(
        "SQ",
        "1",
        FieldType::Float,
        "Phred-scaled probability that this site is variant (non-reference) in this sample",
    ));
}

/// Runs the full pass over one stream: header block first, then one record
/// read, re-genotyped and written per line, preserving input order.
pub fn process_stream<R: BufRead, W: Write>(reader: R, writer: &mut W, seed: u64) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut lines = reader.lines();
    let mut header_lines = Vec::new();
    let mut first_record = None;
    for line in lines.by_ref() {
        let line = line.map_err(|e| SvgtError::Io(format!("Failed to read input: {}", e)))?;
        if line.starts_with('#') {
            header_lines.push(line);
        } else {
            first_record = Some(line);
            break;
        }
    }

    let mut header = Header::from_lines(&header_lines)?;
    prepare_output_header(&mut header);
    writer
        .write_all(header.render().as_bytes())
        .map_err(|e| SvgtError::Io(format!("Failed to write output: {}", e)))?;

    let mut num_records = 0;
    if let Some(line) = first_record {
        process_record(&line, &header, &mut rng, writer)?;
        num_records += 1;
    }
    for line in lines {
        let line = line.map_err(|e| SvgtError::Io(format!("Failed to read input: {}", e)))?;
        if line.starts_with('#') {
            return Err(SvgtError::Data(format!(
                "Header line after the first record: {}",
                line
            )));
        }
        process_record(&line, &header, &mut rng, writer)?;
        num_records += 1;
    }

    log::info!("Re-genotyped {} records", num_records);
    Ok(())
}

fn process_record<W: Write>(
    line: &str,
    header: &Header,
    rng: &mut StdRng,
    writer: &mut W,
) -> Result<()> {
    let mut variant = Variant::from_line(line, header)?;
    regenotype_variant(&mut variant, header, rng)?;
    writeln!(writer, "{}", variant.render(header))
        .map_err(|e| SvgtError::Io(format!("Failed to write output: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn input() -> String {
        [
            "##fileformat=VCFv4.2",
            "##reference=GRCh38",
            "##INFO=<ID=SVTYPE,Number=1,Type=String,Description=\"Type of structural variant\">",
            "##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">",
            "##FORMAT=<ID=AB,Number=1,Type=Float,Description=\"Allele balance\">",
            "##FORMAT=<ID=RO,Number=1,Type=Integer,Description=\"Reference observations\">",
            "##FORMAT=<ID=AO,Number=1,Type=Integer,Description=\"Alternate observations\">",
            "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\tS2\tS3\tS4",
            "chr1\t1000\tsv1\tN\t<DEL>\t12.00\tPASS\tSVTYPE=DEL\tGT:AB:RO:AO\t./.:0.02:30:0\t./.:0.50:15:15\t./.:0.98:0:30\t./.:.:0:0",
        ]
        .join("\n")
    }

    #[test]
    fn stream_rewrites_genotypes_and_qual() {
        let mut output = Vec::new();
        process_stream(Cursor::new(input()), &mut output, 42).unwrap();
        let output = String::from_utf8(output).unwrap();

        // header comes first, with GQ and SQ declared for the fields we emit
        let lines: Vec<&str> = output.lines().collect();
        let body_start = lines.iter().position(|l| !l.starts_with('#')).unwrap();
        assert!(lines[..body_start].iter().all(|l| l.starts_with('#')));
        assert!(output.contains("##FORMAT=<ID=GQ,"));
        assert!(output.contains("##FORMAT=<ID=SQ,"));
        assert!(lines[body_start - 1].starts_with("#CHROM"));

        let record: Vec<&str> = lines[body_start].split('\t').collect();
        assert_eq!(record[8], "GT:AB:RO:AO:GQ:SQ");

        let token = |sample: usize, field: usize| record[9 + sample].split(':').nth(field).unwrap();
        assert_eq!(token(0, 0), "0/0");
        assert_eq!(token(1, 0), "0/1");
        assert_eq!(token(2, 0), "1/1");
        assert_eq!(token(3, 0), "./.");
        assert_eq!(token(3, 4), ".");
        assert_eq!(token(3, 5), ".");

        // QUAL equals the sum of the emitted SQ values, missing ones count 0
        let sq_sum: f64 = (0..3).map(|s| token(s, 5).parse::<f64>().unwrap()).sum();
        let qual: f64 = record[5].parse().unwrap();
        assert!((qual - sq_sum).abs() < 0.05, "{} vs {}", qual, sq_sum);
    }

    #[test]
    fn same_seed_gives_identical_output() {
        let mut first = Vec::new();
        let mut second = Vec::new();
        process_stream(Cursor::new(input()), &mut first, 7).unwrap();
        process_stream(Cursor::new(input()), &mut second, 7).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn short_record_aborts_the_run() {
        let input = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\nchr1\t100\t.\tN\n";
        let mut output = Vec::new();
        assert!(matches!(
            process_stream(Cursor::new(input), &mut output, 42),
            Err(SvgtError::Data(_))
        ));
    }

    #[test]
    fn header_after_body_aborts_the_run() {
        let input = "##FORMAT=<ID=AB,Number=1,Type=Float,Description=\"Allele balance\">\n\
                     ##FORMAT=<ID=RO,Number=1,Type=Integer,Description=\"Reference observations\">\n\
                     ##FORMAT=<ID=AO,Number=1,Type=Integer,Description=\"Alternate observations\">\n\
                     #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\n\
                     chr1\t100\t.\tN\t<DEL>\t0\tPASS\t.\tGT\t./.\n\
                     ##reference=GRCh38\n";
        let mut output = Vec::new();
        assert!(matches!(
            process_stream(Cursor::new(input), &mut output, 42),
            Err(SvgtError::Data(_))
        ));
    }

    #[test]
    fn header_only_stream_still_emits_header() {
        let input = "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\n";
        let mut output = Vec::new();
        process_stream(Cursor::new(input), &mut output, 42).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert!(output.starts_with("##fileformat=VCFv4.2\n"));
        assert!(output.trim_end().ends_with("\tS1"));
    }
}
