//! Text rendering of row-major data.

use std::fmt;

use crate::scalar::Scalar;
use crate::strides::checked_size;

/// Render `data` as nested bracketed rows matching `shape`.
///
/// Rank 0 prints the bare element; otherwise each leading index opens a
/// bracket and rows of the innermost dimensions are comma-separated.
///
/// # Errors
///
/// `fmt::Error` if `data` holds fewer elements than `shape` describes.
///
/// # Example
///
/// ```
/// use qtensor::backend::dump_rows;
/// use qtensor::c64;
///
/// let data = [c64::new(1.0, 0.0), c64::new(0.0, 0.0), c64::new(0.0, 0.0), c64::new(1.0, 0.0)];
/// let mut s = String::new();
/// dump_rows(&[2, 2], &data, &mut s).unwrap();
/// assert_eq!(s, "[[(1,0), (0,0)],\n [(0,0), (1,0)]]");
/// ```
pub fn dump_rows<T: Scalar>(shape: &[usize], data: &[T], out: &mut dyn fmt::Write) -> fmt::Result {
    match checked_size(shape) {
        Some(size) if size <= data.len() => write_block(shape, data, 0, out),
        _ => Err(fmt::Error),
    }
}

fn write_block<T: Scalar>(
    shape: &[usize],
    data: &[T],
    depth: usize,
    out: &mut dyn fmt::Write,
) -> fmt::Result {
    let Some((&rows, inner_shape)) = shape.split_first() else {
        return match data.first() {
            Some(x) => x.write_element(out),
            None => Ok(()),
        };
    };

    let inner: usize = inner_shape.iter().product();
    out.write_char('[')?;
    for i in 0..rows {
        if i > 0 {
            if inner_shape.is_empty() {
                out.write_str(", ")?;
            } else {
                out.write_str(",\n")?;
                for _ in 0..=depth {
                    out.write_char(' ')?;
                }
            }
        }
        write_block(inner_shape, &data[i * inner..(i + 1) * inner], depth + 1, out)?;
    }
    out.write_char(']')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::c64;

    fn render<T: Scalar>(shape: &[usize], data: &[T]) -> String {
        let mut s = String::new();
        dump_rows(shape, data, &mut s).unwrap();
        s
    }

    #[test]
    fn test_dump_scalar() {
        assert_eq!(render(&[], &[c64::new(2.0, -1.0)]), "(2,-1)");
    }

    #[test]
    fn test_dump_vector() {
        assert_eq!(render(&[3], &[1.0, 2.5, -3.0]), "[1, 2.5, -3]");
    }

    #[test]
    fn test_dump_matrix() {
        let data = [
            c64::new(1.0, 0.0),
            c64::new(0.0, 1.0),
            c64::new(0.0, -1.0),
            c64::new(1.0, 0.0),
        ];
        assert_eq!(render(&[2, 2], &data), "[[(1,0), (0,1)],\n [(0,-1), (1,0)]]");
    }

    #[test]
    fn test_dump_rank3() {
        let data: Vec<f64> = (0..8).map(|x| x as f64).collect();
        assert_eq!(
            render(&[2, 2, 2], &data),
            "[[[0, 1],\n  [2, 3]],\n [[4, 5],\n  [6, 7]]]"
        );
    }

    #[test]
    fn test_dump_short_data_is_an_error() {
        let mut s = String::new();
        assert!(dump_rows(&[2, 2], &[1.0, 2.0, 3.0], &mut s).is_err());
        assert!(dump_rows::<f64>(&[], &[], &mut s).is_err());
        assert!(dump_rows::<f64>(&[usize::MAX, 2], &[], &mut s).is_err());
    }

    #[test]
    fn test_dump_zero_dim() {
        assert_eq!(render::<f64>(&[0], &[]), "[]");
        assert_eq!(render::<f64>(&[2, 0], &[]), "[[],\n []]");
    }
}
