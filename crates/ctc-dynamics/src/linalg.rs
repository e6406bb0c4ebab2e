//! 零分配的矩阵检查

use nalgebra::DMatrix;

/// 对称性检查（相对容差）
pub fn is_symmetric(matrix: &DMatrix<f64>, tolerance: f64) -> bool {
    if !matrix.is_square() {
        return false;
    }
    let scale = 1.0 + matrix.amax();
    let n = matrix.nrows();
    for i in 0..n {
        for j in (i + 1)..n {
            if (matrix[(i, j)] - matrix[(j, i)]).abs() > tolerance * scale {
                return false;
            }
        }
    }
    true
}

/// 正定性检查
///
/// 在 `scratch` 上原地做 Cholesky 分解（只使用下三角），任一主元不为正即判定失败。
/// `scratch` 必须与 `matrix` 同形状，调用期间不分配内存。
pub fn is_positive_definite(matrix: &DMatrix<f64>, scratch: &mut DMatrix<f64>) -> bool {
    if !matrix.is_square() || scratch.shape() != matrix.shape() {
        return false;
    }
    scratch.copy_from(matrix);

    let n = matrix.nrows();
    for j in 0..n {
        let mut pivot = scratch[(j, j)];
        for k in 0..j {
            pivot -= scratch[(j, k)] * scratch[(j, k)];
        }
        // NaN 也会在这里被拒绝
        if !(pivot > 0.0) || !pivot.is_finite() {
            return false;
        }
        let l_jj = pivot.sqrt();
        scratch[(j, j)] = l_jj;

        for i in (j + 1)..n {
            let mut s = scratch[(i, j)];
            for k in 0..j {
                s -= scratch[(i, k)] * scratch[(j, k)];
            }
            scratch[(i, j)] = s / l_jj;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_definite() {
        let m = DMatrix::from_row_slice(3, 3, &[4.0, 1.0, 0.5, 1.0, 3.0, 0.2, 0.5, 0.2, 2.0]);
        let mut scratch = DMatrix::zeros(3, 3);
        assert!(is_positive_definite(&m, &mut scratch));
        // 与 nalgebra 的 Cholesky 一致
        assert!(m.clone().cholesky().is_some());
    }

    #[test]
    fn test_not_positive_definite() {
        let mut scratch = DMatrix::zeros(2, 2);

        let indefinite = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]);
        assert!(!is_positive_definite(&indefinite, &mut scratch));

        let singular = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]);
        assert!(!is_positive_definite(&singular, &mut scratch));

        let nan = DMatrix::from_row_slice(2, 2, &[f64::NAN, 0.0, 0.0, 1.0]);
        assert!(!is_positive_definite(&nan, &mut scratch));
    }

    #[test]
    fn test_scratch_shape_mismatch() {
        let m = DMatrix::<f64>::identity(3, 3);
        let mut scratch = DMatrix::zeros(2, 2);
        assert!(!is_positive_definite(&m, &mut scratch));
    }

    #[test]
    fn test_symmetry() {
        let sym = DMatrix::from_row_slice(2, 2, &[2.0, 0.3, 0.3, 1.0]);
        assert!(is_symmetric(&sym, 1e-9));
        let asym = DMatrix::from_row_slice(2, 2, &[2.0, 0.3, 0.4, 1.0]);
        assert!(!is_symmetric(&asym, 1e-9));
        let rect = DMatrix::<f64>::zeros(2, 3);
        assert!(!is_symmetric(&rect, 1e-9));
    }
}
