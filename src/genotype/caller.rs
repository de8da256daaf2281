/// Phred score reported when the best hypothesis holds all of the
/// likelihood mass.
const MAX_PHRED: f64 = 200.0;

/// Base-10 logarithm of the binomial coefficient C(n, k), accumulated
/// term by term so that read depths in the thousands cannot overflow.
pub fn log_choose(n: u64, k: u64) -> f64 {
    debug_assert!(k <= n);
    let k = k.min(n - k);
    let mut sum = 0.0;
    for i in 0..k {
        sum += ((n - i) as f64).log10() - ((i + 1) as f64).log10();
    }
    sum
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zygosity {
    HomRef,
    Het,
    HomAlt,
}

impl Zygosity {
    fn from_index(index: usize) -> Self {
        match index {
            0 => Zygosity::HomRef,
            1 => Zygosity::Het,
            _ => Zygosity::HomAlt,
        }
    }

    pub fn gt(&self) -> &'static str {
        match self {
            Zygosity::HomRef => "0/0",
            Zygosity::Het => "0/1",
            Zygosity::HomAlt => "1/1",
        }
    }
}

/// Outcome of genotyping one sample. `zygosity` is `None` when the sample
/// could not be called, in which case `gq` and `sq` are `None` as well.
#[derive(Debug, Clone, PartialEq)]
pub struct GenotypeCall {
    pub zygosity: Option<Zygosity>,
    pub gq: Option<f64>,
    pub sq: Option<f64>,
}

impl GenotypeCall {
    pub fn missing() -> Self {
        Self {
            zygosity: None,
            gq: None,
            sq: None,
        }
    }

    pub fn gt(&self) -> &'static str {
        match self.zygosity {
            Some(zygosity) => zygosity.gt(),
            None => "./.",
        }
    }
}

/// Calls the zygosity of one sample from its reference and alternate read
/// counts under the three allele-fraction hypotheses `p_alt`, with
/// phred-scaled genotype quality (GQ) and non-reference quality (SQ).
pub fn call_genotype(ref_count: u64, alt_count: u64, p_alt: &[f64; 3]) -> GenotypeCall {
    let depth = ref_count + alt_count;
    if depth == 0 {
        return GenotypeCall::missing();
    }

    let lc = log_choose(depth, alt_count);
    let mut logliks = [0.0_f64; 3];
    for (loglik, &p) in logliks.iter_mut().zip(p_alt) {
        if p <= 0.0 || 1.0 - p <= 0.0 {
            // an allele fraction of exactly 0 or 1 would put a logarithm
            // argument at zero; such a hypothesis gets log-likelihood 0
            *loglik = 0.0;
            continue;
        }
        *loglik = lc + alt_count as f64 * p.log10() + ref_count as f64 * (1.0 - p).log10();
    }

    // first-seen hypothesis wins ties: homref, het, homalt
    let mut best = 0;
    for (index, &loglik) in logliks.iter().enumerate().skip(1) {
        if loglik > logliks[best] {
            best = index;
        }
    }

    let mass: f64 = logliks
        .iter()
        .map(|&loglik| {
            let term = 10.0_f64.powf(loglik);
            if term.is_finite() {
                term
            } else {
                0.0
            }
        })
        .sum();
    if mass <= 0.0 {
        return GenotypeCall::missing();
    }

    let sq = (-10.0 * (logliks[0] - mass.log10())).abs();
    let residual = 1.0 - 10.0_f64.powf(logliks[best]) / mass;
    let gq = if residual <= 0.0 {
        MAX_PHRED
    } else {
        (-10.0 * residual.log10()).abs()
    };

    GenotypeCall {
        zygosity: Some(Zygosity::from_index(best)),
        gq: Some(gq),
        sq: Some(sq),
    }
}
