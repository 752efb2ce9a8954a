//! Host numerical-kernel provider
//!
//! Per-matrix, column-major routines with explicit leading dimensions and
//! caller-provided workspace, mirroring the LAPACK `_work` call contract the
//! harness treats as opaque. None of these routines are reentrant over a
//! shared workspace: every concurrent caller must hand in its own scratch
//! buffer (see the `*_lwork` sizing helpers).

use crate::config::SvectMode;
use crate::dtype::Scalar;

use super::jacobi::{
    argsort_asc, argsort_desc, gram_elements, identity, rotate_columns, rotate_symmetric,
    JacobiRotation,
};

/// Per-element outcome of one Jacobi-method kernel call
#[derive(Clone, Copy, Debug)]
pub struct JacobiOutcome {
    /// Final off-diagonal norm when the iteration stopped
    pub residual: f64,
    /// Sweeps executed
    pub sweeps: u32,
    /// 0 on convergence; 1 if the sweep limit was reached first
    pub info: i32,
}

impl Default for JacobiOutcome {
    fn default() -> Self {
        Self {
            residual: 0.0,
            sweeps: 0,
            info: 0,
        }
    }
}

/// Workspace length for [`geqrf`].
pub fn geqrf_lwork(n: usize) -> usize {
    n.max(1)
}

/// Workspace length for [`gesvdj`].
pub fn gesvdj_lwork(n: usize) -> usize {
    (n * n).max(1)
}

/// Workspace length for [`syevj`].
pub fn syevj_lwork(n: usize) -> usize {
    (n * n).max(1)
}

/// Householder QR factorization of one `m x n` column-major matrix.
///
/// On exit `a` holds R on and above the diagonal and the scaled Householder
/// vectors below it; `tau` (length `min(m, n)`) holds the reflector scalars.
/// `work` must be at least [`geqrf_lwork`]`(n)` elements.
pub fn geqrf<T: Scalar>(m: usize, n: usize, a: &mut [T], lda: usize, tau: &mut [T], work: &mut [T]) {
    let k = m.min(n);
    for col in 0..k {
        let alpha = a[col + col * lda];
        let mut xnorm_sq = T::zero();
        for i in (col + 1)..m {
            let v = a[i + col * lda];
            xnorm_sq = xnorm_sq + v * v;
        }

        if xnorm_sq.to_f64() == 0.0 {
            // column already triangular; H = I
            tau[col] = T::zero();
            continue;
        }

        let norm = (alpha * alpha + xnorm_sq).sqrt_val();
        let beta = if alpha.to_f64() >= 0.0 { -norm } else { norm };
        tau[col] = (beta - alpha) / beta;

        // v = [1, x / (alpha - beta)], stored below the diagonal
        let scale = T::one() / (alpha - beta);
        for i in (col + 1)..m {
            a[i + col * lda] = a[i + col * lda] * scale;
        }
        a[col + col * lda] = beta;

        // w = v^T @ A[col.., col+1..]
        for j in (col + 1)..n {
            let mut w = a[col + j * lda];
            for i in (col + 1)..m {
                w = w + a[i + col * lda] * a[i + j * lda];
            }
            work[j - col - 1] = w;
        }

        // A[col.., col+1..] -= tau * v @ w^T
        for j in (col + 1)..n {
            let tw = tau[col] * work[j - col - 1];
            a[col + j * lda] = a[col + j * lda] - tw;
            for i in (col + 1)..m {
                a[i + j * lda] = a[i + j * lda] - tw * a[i + col * lda];
            }
        }
    }
}

/// One-sided Jacobi SVD of one `m x n` column-major matrix.
///
/// Consumes `a` destructively. Singular values land in `s` (length
/// `min(m, n)`, descending); left/right vectors are written per the svect
/// modes into `u` (`ldu`-strided) and `vt` (`ldvt`-strided) when requested.
/// `work` must be at least [`gesvdj_lwork`]`(n)` elements and is not
/// shareable between concurrent calls.
#[allow(clippy::too_many_arguments)]
pub fn gesvdj<T: Scalar>(
    m: usize,
    n: usize,
    a: &mut [T],
    lda: usize,
    s: &mut [T],
    mut u: Option<(&mut [T], usize)>,
    mut vt: Option<(&mut [T], usize)>,
    left: SvectMode,
    right: SvectMode,
    tolerance: f64,
    max_sweeps: u32,
    work: &mut [T],
) -> JacobiOutcome {
    let k = m.min(n);
    if k == 0 {
        return JacobiOutcome::default();
    }

    // accumulate right rotations in the workspace: V is n x n, ld n
    let v = &mut work[..n * n];
    identity(v, n);

    let mut outcome = JacobiOutcome {
        residual: f64::INFINITY,
        sweeps: 0,
        info: 1,
    };

    for sweep in 1..=max_sweeps {
        let mut off_sum = 0.0f64;
        for p in 0..n {
            for q in (p + 1)..n {
                let (a_pp, a_qq, a_pq) = gram_elements(a, m, lda, p, q);
                off_sum += a_pq.to_f64() * a_pq.to_f64();

                if a_pq.abs_val().to_f64()
                    <= tolerance * (a_pp.to_f64() * a_qq.to_f64()).sqrt()
                {
                    continue;
                }

                let rot = JacobiRotation::compute(a_pp.to_f64(), a_qq.to_f64(), a_pq.to_f64());
                rotate_columns(a, m, lda, p, q, &rot);
                rotate_columns(v, n, n, p, q, &rot);
            }
        }

        outcome.sweeps = sweep;
        outcome.residual = off_sum.sqrt();
        if outcome.residual < tolerance {
            outcome.info = 0;
            break;
        }
    }

    // singular values are the column norms of the rotated matrix
    let mut norms = vec![T::zero(); n];
    for (j, norm) in norms.iter_mut().enumerate() {
        let col = &a[j * lda..j * lda + m];
        let mut sum = T::zero();
        for &x in col {
            sum = sum + x * x;
        }
        *norm = sum.sqrt_val();
    }
    let order = argsort_desc(&norms);
    for (jj, &src) in order.iter().take(k).enumerate() {
        s[jj] = norms[src];
    }

    if left != SvectMode::None {
        if let Some((u_buf, ldu)) = u.as_mut() {
            let u_cols = if left == SvectMode::All { m } else { k };
            u_buf[..*ldu * u_cols].fill(T::zero());
            for (jj, &src) in order.iter().take(u_cols.min(n)).enumerate() {
                let norm = norms[src];
                if norm.to_f64() <= T::epsilon_val() {
                    continue;
                }
                for i in 0..m {
                    u_buf[i + jj * *ldu] = a[i + src * lda] / norm;
                }
            }
        }
    }

    if right != SvectMode::None {
        if let Some((vt_buf, ldvt)) = vt.as_mut() {
            let vt_rows = if right == SvectMode::All { n } else { k };
            vt_buf[..*ldvt * n].fill(T::zero());
            for (jj, &src) in order.iter().take(vt_rows).enumerate() {
                for j in 0..n {
                    vt_buf[jj + j * *ldvt] = v[j + src * n];
                }
            }
        }
    }

    outcome
}

/// Two-sided Jacobi eigendecomposition of one symmetric `n x n` column-major
/// matrix.
///
/// Consumes `a` destructively: on exit its columns are the eigenvectors, in
/// the order of `w` (eigenvalues, ascending). `work` must be at least
/// [`syevj_lwork`]`(n)` elements and is not shareable between concurrent
/// calls.
pub fn syevj<T: Scalar>(
    n: usize,
    a: &mut [T],
    lda: usize,
    w: &mut [T],
    tolerance: f64,
    max_sweeps: u32,
    work: &mut [T],
) -> JacobiOutcome {
    if n == 0 {
        return JacobiOutcome::default();
    }

    let v = &mut work[..n * n];
    identity(v, n);

    let mut outcome = JacobiOutcome {
        residual: f64::INFINITY,
        sweeps: 0,
        info: 1,
    };

    for sweep in 1..=max_sweeps {
        let mut off_sum = 0.0f64;
        for p in 0..n {
            for q in (p + 1)..n {
                let a_pq = a[p + q * lda];
                off_sum += a_pq.to_f64() * a_pq.to_f64();

                if a_pq.abs_val().to_f64() <= tolerance {
                    continue;
                }

                let a_pp = a[p + p * lda];
                let a_qq = a[q + q * lda];
                let rot = JacobiRotation::compute(a_pp.to_f64(), a_qq.to_f64(), a_pq.to_f64());
                rotate_symmetric(a, n, lda, p, q, &rot, a_pp, a_qq, a_pq);
                rotate_columns(v, n, n, p, q, &rot);
            }
        }

        outcome.sweeps = sweep;
        outcome.residual = off_sum.sqrt();
        if outcome.residual < tolerance {
            outcome.info = 0;
            break;
        }
    }

    // eigenvalues from the diagonal, ascending; eigenvectors into `a`
    let mut diag = vec![T::zero(); n];
    for (i, d) in diag.iter_mut().enumerate() {
        *d = a[i + i * lda];
    }
    let order = argsort_asc(&diag);
    for (jj, &src) in order.iter().enumerate() {
        w[jj] = diag[src];
    }
    for (jj, &src) in order.iter().enumerate() {
        for i in 0..n {
            a[i + jj * lda] = v[i + src * n];
        }
    }

    outcome
}
