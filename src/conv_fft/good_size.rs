use crate::{Error, Result};

/// Largest transform length the Fourier transform accepts.
pub const MAX_FOURIER_TRANSFORM_SIZE: usize = i32::MAX as usize;

/// Smallest `2^a 3^b 5^c` at least `n`: for every `3^b 5^c` below the
/// next power of two, doubles it until it reaches `n`.
fn good_size(n: usize) -> usize {
    let mut best = n.next_power_of_two();

    let mut p5 = 1;
    while p5 < best {
        let mut p35 = p5;
        while p35 < best {
            let mut candidate = p35;
            while candidate < n {
                candidate *= 2;
            }
            best = best.min(candidate);
            p35 *= 3;
        }
        p5 *= 5;
    }

    best
}

/// Fails if `n` samples cannot be transformed.
pub(crate) fn check_size(n: usize) -> Result<usize> {
    if n > MAX_FOURIER_TRANSFORM_SIZE {
        Err(Error::SizeTooLarge(n))
    } else {
        Ok(n)
    }
}

/// Smallest size at least `n` that the Fourier transform handles
/// efficiently (small prime factors only).
pub fn optimal_fourier_transform_size(n: usize) -> Result<usize> {
    check_size(n)?;
    if n <= 1 {
        return Ok(n.max(1));
    }
    check_size(good_size(n))
}

/// Applies [`optimal_fourier_transform_size`] to every dimension.
pub(crate) fn compute(sizes: &[usize]) -> Result<Vec<usize>> {
    sizes
        .iter()
        .map(|&n| optimal_fourier_transform_size(n))
        .collect()
}
