use rustfft::FftPlanner;

use super::Processor as ProcessorTrait;
use super::*;

pub struct Processor<T: ConvFloat> {
    cp: FftPlanner<T>,
}

impl<T: ConvFloat> Default for Processor<T> {
    fn default() -> Self {
        Self {
            cp: FftPlanner::new(),
        }
    }
}

impl<T: ConvFloat> Processor<T> {
    fn transform<D: Dimension>(&mut self, data: &mut Array<Complex<T>, D>, direction: FftDirection) {
        for dim in 0..data.ndim() {
            fft_axis(&mut self.cp, data, Axis(dim), direction);
        }
    }
}

impl<T: ConvFloat> ProcessorTrait<T, Complex<T>> for Processor<T> {
    fn forward<S: Data<Elem = Complex<T>>, D: Dimension>(
        &mut self,
        input: &ArrayBase<S, D>,
    ) -> Result<Array<Complex<T>, D>> {
        let mut output = input.to_owned();
        self.transform(&mut output, FftDirection::Forward);
        Ok(output)
    }

    fn backward<D: Dimension>(
        &mut self,
        mut input: Array<Complex<T>, D>,
    ) -> Result<Array<Complex<T>, D>> {
        let norm = normalization::<T>(input.len())?;
        self.transform(&mut input, FftDirection::Inverse);
        input.par_mapv_inplace(|x| x * norm);
        Ok(input)
    }
}
