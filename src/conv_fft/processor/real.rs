use realfft::{FftError, RealFftPlanner};
use rustfft::FftPlanner;

use super::Processor as ProcessorTrait;
use super::*;

pub struct Processor<T: ConvFloat> {
    rp: RealFftPlanner<T>,
    rp_origin_len: usize,
    cp: FftPlanner<T>,
}

impl<T: ConvFloat> Default for Processor<T> {
    fn default() -> Self {
        Self {
            rp: RealFftPlanner::new(),
            rp_origin_len: 0,
            cp: FftPlanner::new(),
        }
    }
}

fn last_axis(ndim: usize) -> Result<Axis> {
    match ndim {
        0 => Err(Error::DimensionalityNotSupported(0)),
        n => Ok(Axis(n - 1)),
    }
}

impl<T: ConvFloat> ProcessorTrait<T, T> for Processor<T> {
    /// Real-to-complex transform of the last axis (which shrinks to
    /// `n / 2 + 1` bins), then complex transforms of the others.
    ///
    /// The length of the last axis is remembered for [`backward`](Self::backward).
    fn forward<S: Data<Elem = T>, D: Dimension>(
        &mut self,
        input: &ArrayBase<S, D>,
    ) -> Result<Array<Complex<T>, D>> {
        let last = last_axis(input.ndim())?;
        if input.is_empty() {
            return Err(Error::NotForged);
        }

        let rp = self.rp.plan_fft_forward(input.len_of(last));
        self.rp_origin_len = rp.len();

        let mut output_shape = input.raw_dim();
        output_shape[last.index()] = rp.complex_len();
        let mut output = Array::zeros(output_shape);

        let mut buffer = rp.make_input_vec();
        let mut spectrum = rp.make_output_vec();
        let mut scratch = rp.make_scratch_vec();
        for (lane, mut out) in input.lanes(last).into_iter().zip(output.lanes_mut(last)) {
            buffer
                .iter_mut()
                .zip(lane.iter())
                .for_each(|(b, &v)| *b = v);
            rp.process_with_scratch(&mut buffer, &mut spectrum, &mut scratch)?;
            out.iter_mut()
                .zip(spectrum.iter())
                .for_each(|(o, &s)| *o = s);
        }

        for dim in 0..last.index() {
            fft_axis(&mut self.cp, &mut output, Axis(dim), FftDirection::Forward);
        }

        Ok(output)
    }

    /// Inverse of [`forward`](Self::forward): complex inverse transforms of
    /// all axes but the last, then a complex-to-real transform of the last.
    fn backward<D: Dimension>(&mut self, mut input: Array<Complex<T>, D>) -> Result<Array<T, D>> {
        let last = last_axis(input.ndim())?;
        if self.rp_origin_len == 0 {
            return Err(Error::NotForged);
        }

        let rp = self.rp.plan_fft_inverse(self.rp_origin_len);
        if input.len_of(last) != rp.complex_len() {
            return Err(Error::SizesDontMatch {
                expected: vec![rp.complex_len()],
                found: vec![input.len_of(last)],
            });
        }

        for dim in 0..last.index() {
            fft_axis(&mut self.cp, &mut input, Axis(dim), FftDirection::Inverse);
        }

        let mut output_shape = input.raw_dim();
        output_shape[last.index()] = self.rp_origin_len;
        let mut output = Array::zeros(output_shape);
        let norm = normalization::<T>(output.len())?;

        let mut spectrum = rp.make_input_vec();
        let mut buffer = rp.make_output_vec();
        let mut scratch = rp.make_scratch_vec();
        for (lane, mut out) in input.lanes(last).into_iter().zip(output.lanes_mut(last)) {
            spectrum
                .iter_mut()
                .zip(lane.iter())
                .for_each(|(s, &v)| *s = v);
            match rp.process_with_scratch(&mut spectrum, &mut buffer, &mut scratch) {
                // rounding leaves tiny imaginary parts in the DC and Nyquist
                // bins; realfft ignores them
                Ok(()) | Err(FftError::InputValues(..)) => {}
                Err(err) => return Err(err.into()),
            }
            out.iter_mut()
                .zip(buffer.iter())
                .for_each(|(o, &b)| *o = b * norm);
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};

    #[test]
    fn forward_backward() {
        let original = array![
            [[1., 2., 3.], [4., 5., 6.]],
            [[7., 8., 9.], [10., 11., 12.]],
        ];

        let mut p = Processor::<f64>::default();
        let freq = p.forward(&original).unwrap();
        assert_eq!(freq.shape(), &[2, 2, 2]);
        assert!((freq[[0, 0, 0]].re - 78.).abs() < 1e-10);

        let recon = p.backward(freq).unwrap();
        for (a, b) in original.iter().zip(recon.iter()) {
            assert!((a - b).abs() < 1e-10, "Reconstructed {} vs {}", b, a);
        }
    }

    #[test]
    fn matches_complex_processor() {
        let original = Array3::from_shape_fn((3, 5, 6), |(i, j, k)| {
            ((i * 7 + j * 3 + k) % 11) as f64 - 4.
        });

        let mut rp = Processor::<f64>::default();
        let half = rp.forward(&original).unwrap();

        let mut cp = super::super::complex::Processor::<f64>::default();
        let full = cp.forward(&original.mapv(|v| Complex::new(v, 0.))).unwrap();

        half.indexed_iter().for_each(|(index, &v)| {
            let w = full[index];
            assert!((v - w).norm() < 1e-9, "Mismatch at {:?}: {} vs {}", index, v, w);
        });
    }

    #[test]
    fn backward_before_forward() {
        let mut p = Processor::<f32>::default();
        let spectrum = Array3::<Complex<f32>>::zeros((2, 2, 2));
        assert!(matches!(p.backward(spectrum), Err(Error::NotForged)));
    }
}
