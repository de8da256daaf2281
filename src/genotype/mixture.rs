use rand::{rngs::StdRng, seq::IndexedRandom, Rng};

const NUM_COMPONENTS: usize = 3;
const NUM_RESTARTS: usize = 8;
const MAX_ITERATIONS: usize = 200;
const LOGLIK_TOL: f64 = 1e-6;
const MIN_VARIANCE: f64 = 1e-4;

/// Allele fractions assumed when there are too few observations to fit a
/// mixture: homozygous-reference, heterozygous, homozygous-alternate.
pub const DEFAULT_P_ALT: [f64; 3] = [0.03, 0.5, 0.97];

/// Fits a 3-component 1-D Gaussian mixture to the allele-balance
/// observations of one variant and returns the component means sorted
/// ascending. The RNG seeds the restart initializations, so results are
/// reproducible for a fixed seed.
pub fn fit_allele_balance(balances: &[f64], rng: &mut StdRng) -> [f64; 3] {
    if balances.len() < NUM_COMPONENTS {
        return DEFAULT_P_ALT;
    }

    let mut best_means = DEFAULT_P_ALT;
    let mut best_loglik = f64::NEG_INFINITY;
    for attempt in 0..NUM_RESTARTS {
        let (loglik, means) = fit_once(balances, attempt, rng);
        if loglik > best_loglik {
            best_loglik = loglik;
            best_means = means;
        }
    }
    best_means.sort_by(f64::total_cmp);
    best_means
}

fn initial_means(balances: &[f64], attempt: usize, rng: &mut StdRng) -> [f64; NUM_COMPONENTS] {
    let mut means = [0.0; NUM_COMPONENTS];
    if attempt == 0 {
        // evenly spaced quantiles; deterministic and a good fit when the
        // observations form separated clusters
        let mut sorted = balances.to_vec();
        sorted.sort_by(f64::total_cmp);
        for (index, mean) in means.iter_mut().enumerate() {
            *mean = sorted[(2 * index + 1) * sorted.len() / (2 * NUM_COMPONENTS)];
        }
    } else {
        for (mean, &pick) in means
            .iter_mut()
            .zip(balances.choose_multiple(rng, NUM_COMPONENTS))
        {
            // jitter keeps duplicate observations from collapsing components
            *mean = pick + (rng.random::<f64>() - 0.5) * 1e-3;
        }
    }
    means
}

fn fit_once(balances: &[f64], attempt: usize, rng: &mut StdRng) -> (f64, [f64; NUM_COMPONENTS]) {
    let n = balances.len();
    let mut means = initial_means(balances, attempt, rng);

    let global_mean = balances.iter().sum::<f64>() / n as f64;
    let global_var = balances
        .iter()
        .map(|x| (x - global_mean).powi(2))
        .sum::<f64>()
        / n as f64;
    let mut variances = [global_var.max(MIN_VARIANCE); NUM_COMPONENTS];
    let mut weights = [1.0 / NUM_COMPONENTS as f64; NUM_COMPONENTS];

    let mut responsibilities = vec![[0.0_f64; NUM_COMPONENTS]; n];
    let mut prev_loglik = f64::NEG_INFINITY;
    let mut loglik = prev_loglik;
    for _ in 0..MAX_ITERATIONS {
        // E step
        loglik = 0.0;
        for (resp, &x) in responsibilities.iter_mut().zip(balances) {
            for k in 0..NUM_COMPONENTS {
                resp[k] = weights[k] * normal_density(x, means[k], variances[k]);
            }
            let total: f64 = resp.iter().sum();
            if total > 0.0 {
                for r in resp.iter_mut() {
                    *r /= total;
                }
                loglik += total.ln();
            } else {
                *resp = [1.0 / NUM_COMPONENTS as f64; NUM_COMPONENTS];
                loglik += f64::MIN_POSITIVE.ln();
            }
        }

        // M step; a starved component keeps its parameters
        for k in 0..NUM_COMPONENTS {
            let nk: f64 = responsibilities.iter().map(|resp| resp[k]).sum();
            if nk <= f64::MIN_POSITIVE {
                continue;
            }
            means[k] = responsibilities
                .iter()
                .zip(balances)
                .map(|(resp, &x)| resp[k] * x)
                .sum::<f64>()
                / nk;
            variances[k] = (responsibilities
                .iter()
                .zip(balances)
                .map(|(resp, &x)| resp[k] * (x - means[k]).powi(2))
                .sum::<f64>()
                / nk)
                .max(MIN_VARIANCE);
            weights[k] = nk / n as f64;
        }

        if (loglik - prev_loglik).abs() < LOGLIK_TOL {
            break;
        }
        prev_loglik = loglik;
    }

    (loglik, means)
}

fn normal_density(x: f64, mean: f64, variance: f64) -> f64 {
    let delta = x - mean;
    (-delta * delta / (2.0 * variance)).exp() / (2.0 * std::f64::consts::PI * variance).sqrt()
}
