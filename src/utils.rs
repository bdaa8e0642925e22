use anyhow::{Result, bail};
use std::{fmt::Debug, ops::RangeBounds};

pub(crate) fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

pub(crate) fn check_mat(mat: &[Vec<f64>], exp_dim: (usize, usize), prob_mat: bool) -> Result<()> {
    // Ensure matrix has expected dimensions.
    let exp_n_rows = exp_dim.0;
    let exp_n_cols = exp_dim.1;
    let n_rows = mat.len();
    if n_rows != exp_n_rows {
        bail!("matrix must have {exp_n_rows} rows, but has {n_rows}");
    }
    if mat.iter().any(|row| row.len() != exp_n_cols) {
        bail!("matrix must have {exp_n_cols} columns");
    }
    if !prob_mat {
        return Ok(());
    }
    // For probability matrices: every entry is an independent probability.
    for row in mat {
        for &ele in row {
            if !(0.0..=1.0).contains(&ele) {
                bail!("matrix entries must be in the range [0, 1], but one is {ele}");
            }
        }
    }
    Ok(())
}
