// src/solver/mod.rs — Derivative-free bounded 1-D minimization
//
// Golden-section search. The cost surfaces here carry penalty terms with
// discontinuous regime boundaries, so nothing may assume smoothness.

use crate::infra::config::SolverConfig;
use crate::infra::errors::ApsisError;

const INVPHI: f64 = 0.618_033_988_749_894_8;

#[derive(Debug, Clone)]
pub struct SolverOptions {
    /// Cost-function evaluation budget.
    pub max_evals: u32,
    /// Interval width at which the search stops.
    pub tolerance: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_evals: 64,
            tolerance: 1e-4,
        }
    }
}

impl From<&SolverConfig> for SolverOptions {
    fn from(cfg: &SolverConfig) -> Self {
        Self {
            max_evals: cfg.max_evals,
            tolerance: cfg.tolerance,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Solution {
    pub x: f64,
    pub cost: f64,
    pub evals: u32,
}

/// Minimize `cost` over the closed interval `[lo, hi]`.
///
/// Returns `SolverFailure` when the interval has not shrunk below the
/// tolerance within the evaluation budget; a budget under 2 fails before
/// the cost function is ever called. The caller treats either as "no
/// improvement this iteration", not a fatal error.
pub fn minimize_scalar(
    mut cost: impl FnMut(f64) -> f64,
    lo: f64,
    hi: f64,
    opts: &SolverOptions,
) -> Result<Solution, ApsisError> {
    if !(lo.is_finite() && hi.is_finite()) || lo > hi {
        return Err(ApsisError::SolverFailure {
            evals: 0,
            width: hi - lo,
        });
    }

    // The search opens with two interior seeds, so a budget below 2 can
    // never converge. Fail before the first cost call.
    if opts.max_evals < 2 {
        return Err(ApsisError::SolverFailure {
            evals: 0,
            width: hi - lo,
        });
    }

    // Degenerate interval: the only candidate is the endpoint itself.
    if hi - lo <= opts.tolerance {
        let x = (lo + hi) / 2.0;
        return Ok(Solution {
            x,
            cost: cost(x),
            evals: 1,
        });
    }

    let mut a = lo;
    let mut b = hi;
    let mut c = b - (b - a) * INVPHI;
    let mut d = a + (b - a) * INVPHI;
    let mut fc = cost(c);
    let mut fd = cost(d);
    let mut evals: u32 = 2;

    while (b - a) > opts.tolerance {
        if evals >= opts.max_evals {
            return Err(ApsisError::SolverFailure {
                evals,
                width: b - a,
            });
        }
        if fc < fd {
            b = d;
            d = c;
            fd = fc;
            c = b - (b - a) * INVPHI;
            fc = cost(c);
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + (b - a) * INVPHI;
            fd = cost(d);
        }
        evals += 1;
    }

    let (x, best) = if fc < fd { (c, fc) } else { (d, fd) };
    Ok(Solution {
        x,
        cost: best,
        evals,
    })
}
