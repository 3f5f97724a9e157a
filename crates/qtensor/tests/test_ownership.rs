//! Tests for buffer ownership through the Tensor facade.
//!
//! Covers:
//! - Copy isolation from the caller's buffer
//! - Borrow aliasing in both directions
//! - Take transferring the allocation
//! - Failed re-pointing preserving the previous state

use std::ptr::NonNull;

use qtensor::{OwnershipMode, Tensor, TensorError, c64};

fn sample() -> Vec<c64> {
    (0..6).map(|i| c64::new(i as f64, -(i as f64))).collect()
}

#[test]
fn test_copy_ignores_later_external_writes() {
    let mut external = sample();
    let t: Tensor = Tensor::from_slice(&external, &[2, 3]).unwrap();

    external.iter_mut().for_each(|z| *z = c64::new(42.0, 0.0));
    assert_eq!(t.data(), sample().as_slice());
}

#[test]
fn test_borrow_sees_external_writes() {
    let mut external = sample();
    let ptr = NonNull::new(external.as_mut_ptr()).unwrap();

    let mut t: Tensor = Tensor::zeros(&[0]).unwrap();
    unsafe { t.borrow_raw(ptr, external.len(), &[3, 2]) }.unwrap();
    assert_eq!(t.mode(), OwnershipMode::Borrowed);

    // Caller writes straight to its memory while the tensor views it.
    unsafe { ptr.as_ptr().add(5).write(c64::new(-1.0, 1.0)) };
    assert_eq!(*t.at(&[2, 1]).unwrap(), c64::new(-1.0, 1.0));

    // And tensor writes land in caller memory.
    t.set(&[0, 0], c64::new(9.0, 9.0)).unwrap();
    drop(t);
    assert_eq!(external[0], c64::new(9.0, 9.0));
    assert_eq!(external[5], c64::new(-1.0, 1.0));
}

#[test]
fn test_borrowed_tensor_does_not_free_caller_memory() {
    let mut external = sample();
    {
        let mut t: Tensor = Tensor::borrowed(&mut external, &[6]).unwrap();
        t.fill(c64::new(1.0, 1.0));
    }
    assert_eq!(external.len(), 6);
    assert!(external.iter().all(|&z| z == c64::new(1.0, 1.0)));
}

#[test]
fn test_take_accepts_boxed_slice() {
    let boxed: Box<[c64]> = sample().into_boxed_slice();
    let mut t: Tensor = Tensor::zeros(&[2]).unwrap();
    t.take(boxed, &[6]).unwrap();
    assert_eq!(t.mode(), OwnershipMode::Taken);
    assert_eq!(*t.at(&[4]).unwrap(), c64::new(4.0, -4.0));
}

#[test]
fn test_failed_repointing_keeps_borrowed_state() {
    let mut external = sample();
    let mut t: Tensor = Tensor::borrowed(&mut external, &[2, 3]).unwrap();

    assert!(matches!(
        t.copy(&sample(), &[7]),
        Err(TensorError::InvalidShape {
            required: 7,
            actual: 6,
            ..
        })
    ));
    assert!(matches!(
        t.take(sample(), &[3, 3]),
        Err(TensorError::InvalidShape { .. })
    ));

    assert_eq!(t.mode(), OwnershipMode::Borrowed);
    assert_eq!(t.shape(), &[2, 3]);
    t.set(&[1, 2], c64::new(0.5, 0.5)).unwrap();
    drop(t);
    assert_eq!(external[5], c64::new(0.5, 0.5));
}

#[test]
fn test_repointing_releases_previous_buffer() {
    let mut t: Tensor = Tensor::from_data(sample(), &[6]).unwrap();
    t.copy(&sample()[..4], &[2, 2]).unwrap();
    assert_eq!(t.mode(), OwnershipMode::Owned);
    assert_eq!(t.shape(), &[2, 2]);
    assert_eq!(*t.at(&[1, 1]).unwrap(), c64::new(3.0, -3.0));
}

#[test]
fn test_arithmetic_results_are_owned() {
    let mut external = sample();
    let a: Tensor = Tensor::borrowed(&mut external, &[2, 3]).unwrap();
    let b: Tensor = Tensor::from_data(sample(), &[3, 2]).unwrap();

    assert_eq!(a.multiply(&b).unwrap().mode(), OwnershipMode::Owned);
    assert_eq!(a.scale(0.5).unwrap().mode(), OwnershipMode::Owned);
    assert_eq!((&a + &a).unwrap().mode(), OwnershipMode::Owned);
    assert_eq!(a.try_clone().unwrap().mode(), OwnershipMode::Owned);
}
