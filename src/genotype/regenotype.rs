use crate::genotype::{call_genotype, fit_allele_balance, GenotypeCall};
use crate::utils::Result;
use crate::vcf::{GenotypeValue, Header, Variant};
use rand::rngs::StdRng;

/// Re-genotypes every sample of one variant: fits the allele-balance
/// mixture over the samples with an observed `AB`, calls each sample with
/// `RO`/`AO` coverage, writes `GT`/`GQ`/`SQ` back and replaces the record
/// `QUAL` with the sum of the per-sample `SQ` values.
pub fn regenotype_variant(variant: &mut Variant, header: &Header, rng: &mut StdRng) -> Result<()> {
    let mut balances = Vec::new();
    for sample in header.samples() {
        if let Some(GenotypeValue::Float(ab)) = variant.genotype_field(header, sample, "AB")? {
            balances.push(*ab);
        }
    }
    let p_alt = fit_allele_balance(&balances, rng);

    let mut total_qual = 0.0;
    let samples: Vec<String> = header.samples().to_vec();
    for sample in &samples {
        let ref_count = read_count(variant, header, sample, "RO")?;
        let alt_count = read_count(variant, header, sample, "AO")?;
        let call = match (ref_count, alt_count) {
            (Some(ref_count), Some(alt_count)) => call_genotype(ref_count, alt_count, &p_alt),
            _ => GenotypeCall::missing(),
        };

        variant.set_genotype_field(
            header,
            sample,
            "GT",
            GenotypeValue::Text(call.gt().to_string()),
        )?;
        variant.set_genotype_field(
            header,
            sample,
            "GQ",
            call.gq.map(GenotypeValue::Float).unwrap_or(GenotypeValue::Missing),
        )?;
        variant.set_genotype_field(
            header,
            sample,
            "SQ",
            call.sq.map(GenotypeValue::Float).unwrap_or(GenotypeValue::Missing),
        )?;
        if let Some(sq) = call.sq {
            total_qual += sq;
        }
    }
    variant.qual = total_qual;
    Ok(())
}

fn read_count(
    variant: &Variant,
    header: &Header,
    sample: &str,
    id: &str,
) -> Result<Option<u64>> {
    Ok(match variant.genotype_field(header, sample, id)? {
        Some(GenotypeValue::Int(count)) if *count >= 0 => Some(*count as u64),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcf::FieldDef;
    use crate::vcf::FieldType;
    use rand::SeedableRng;

    fn test_header(num_samples: usize) -> Header {
        let samples = (1..=num_samples)
            .map(|i| format!("S{}", i))
            .collect::<Vec<_>>()
            .join("\t");
        let lines: Vec<String> = vec![
            "##INFO=<ID=SVTYPE,Number=1,Type=String,Description=\"Type of structural variant\">"
                .to_string(),
            "##FORMAT=<ID=AB,Number=1,Type=Float,Description=\"Allele balance\">".to_string(),
            "##FORMAT=<ID=RO,Number=1,Type=Integer,Description=\"Reference observations\">"
                .to_string(),
            "##FORMAT=<ID=AO,Number=1,Type=Integer,Description=\"Alternate observations\">"
                .to_string(),
            format!("#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\t{}", samples),
        ];
        let mut header = Header::from_lines(&lines).unwrap();
        header.add_format(FieldDef::new("GQ", "1", FieldType::Float, "Genotype quality"));
        header.add_format(FieldDef::new("SQ", "1", FieldType::Float, "Sample quality"));
        header
    }

    #[test]
    fn replaces_genotypes_and_qual() {
        let header = test_header(3);
        let line = "chr1\t1000\tsv1\tN\t<DEL>\t99.00\tPASS\tSVTYPE=DEL\tGT:AB:RO:AO\t\
                    ./.:0.02:30:0\t./.:0.50:15:15\t./.:0.98:0:30";
        let mut variant = Variant::from_line(line, &header).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        regenotype_variant(&mut variant, &header, &mut rng).unwrap();

        let gt = |sample: &str| {
            variant
                .genotype_field(&header, sample, "GT")
                .unwrap()
                .cloned()
        };
        assert_eq!(gt("S1"), Some(GenotypeValue::Text("0/0".to_string())));
        assert_eq!(gt("S2"), Some(GenotypeValue::Text("0/1".to_string())));
        assert_eq!(gt("S3"), Some(GenotypeValue::Text("1/1".to_string())));

        // QUAL is replaced by the SQ sum, not added to the input QUAL
        let mut sq_sum = 0.0;
        for sample in ["S1", "S2", "S3"] {
            match variant.genotype_field(&header, sample, "SQ").unwrap() {
                Some(GenotypeValue::Float(sq)) => sq_sum += sq,
                other => panic!("expected SQ for {}: {:?}", sample, other),
            }
        }
        assert!((variant.qual - sq_sum).abs() < 1e-9);
    }

    #[test]
    fn zero_depth_sample_stays_unknown() {
        let header = test_header(4);
        let line = "chr1\t1000\tsv1\tN\t<DEL>\t0\tPASS\tSVTYPE=DEL\tGT:AB:RO:AO\t\
                    ./.:0.02:30:0\t./.:0.50:15:15\t./.:0.98:0:30\t./.:.:0:0";
        let mut variant = Variant::from_line(line, &header).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        regenotype_variant(&mut variant, &header, &mut rng).unwrap();

        assert_eq!(
            variant.genotype_field(&header, "S4", "GT").unwrap(),
            Some(&GenotypeValue::Text("./.".to_string()))
        );
        assert_eq!(
            variant.genotype_field(&header, "S4", "GQ").unwrap(),
            Some(&GenotypeValue::Missing)
        );
        assert_eq!(
            variant.genotype_field(&header, "S4", "SQ").unwrap(),
            Some(&GenotypeValue::Missing)
        );
    }

    #[test]
    fn missing_counts_do_not_contribute_to_qual() {
        let header = test_header(2);
        let line = "chr1\t1000\tsv1\tN\t<DEL>\t0\tPASS\tSVTYPE=DEL\tGT:AB:RO:AO\t\
                    ./.:0.98:0:30\t./.:.:.:.";
        let mut variant = Variant::from_line(line, &header).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        regenotype_variant(&mut variant, &header, &mut rng).unwrap();

        let s1_sq = match variant.genotype_field(&header, "S1", "SQ").unwrap() {
            Some(GenotypeValue::Float(sq)) => *sq,
            other => panic!("expected SQ for S1: {:?}", other),
        };
        assert!((variant.qual - s1_sq).abs() < 1e-9);
        assert_eq!(
            variant.genotype_field(&header, "S2", "GT").unwrap(),
            Some(&GenotypeValue::Text("./.".to_string()))
        );
    }

    #[test]
    fn undeclared_ab_field_is_config_error() {
        let lines: Vec<String> = vec![
            "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1".to_string(),
        ];
        let header = Header::from_lines(&lines).unwrap();
        let line = "chr1\t1000\tsv1\tN\t<DEL>\t0\tPASS\t.\tGT\t0/1";
        let mut variant = Variant::from_line(line, &header).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        assert!(regenotype_variant(&mut variant, &header, &mut rng).is_err());
    }
}
