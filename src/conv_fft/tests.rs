use super::*;
use super::fourier::fftshift;
use crate::{general_convolution, OneDimensionalFilter, SeparableConvExt};
use ndarray::prelude::*;
use ndarray_rand::{
    rand::{rngs::StdRng, SeedableRng},
    rand_distr::Uniform,
    RandomExt,
};

const TOLERANCE_F64: f64 = 1e-9;

fn assert_close<D: Dimension>(a: &Array<f64, D>, b: &Array<f64, D>, tolerance: f64) {
    assert_eq!(a.shape(), b.shape(), "Shape mismatch");
    a.iter()
        .zip(b.iter())
        .enumerate()
        .for_each(|(idx, (x, y))| {
            let diff = (x - y).abs();
            assert!(
                diff <= tolerance * x.abs().max(1.0),
                "Mismatch at index {}: {:.10} vs {:.10}, diff={:e}",
                idx,
                x,
                y,
                diff
            );
        });
}

mod centered_dft {
    use super::*;

    #[test]
    fn delta_at_origin_is_flat() {
        let mut delta = Array2::<f64>::zeros((5, 6));
        delta[[2, 3]] = 1.0;

        let spectrum = fourier_transform(&delta).unwrap();
        spectrum.iter().for_each(|v| {
            assert!((v - Complex::new(1.0, 0.0)).norm() < 1e-12, "Bin {}", v);
        });
    }

    #[test]
    fn dc_is_centered() {
        let arr = Array2::from_elem((4, 7), 2.0f32);
        let spectrum = fourier_transform(&arr).unwrap();
        assert!((spectrum[[2, 3]].re - 56.0).abs() < 1e-4);
        assert!(spectrum[[0, 0]].norm() < 1e-4);
    }

    #[test]
    fn inverse_round_trip() {
        let mut rng = StdRng::seed_from_u64(21);
        let arr = Array::random_using((7, 4, 3), Uniform::new(-1., 1.), &mut rng);

        let spectrum = fourier_transform(&arr).unwrap();
        let back = inverse_fourier_transform(&spectrum).unwrap();
        assert_close(&back.mapv(|c| c.re), &arr, TOLERANCE_F64);
        back.iter()
            .for_each(|c| assert!(c.im.abs() < 1e-12, "Imaginary residue {}", c.im));
    }

    #[test]
    fn shifts_are_inverse() {
        let arr = Array2::from_shape_fn((5, 4), |(i, j)| (i * 4 + j) as f64);
        assert_eq!(ifftshift(fftshift(arr.clone())), arr);
        // origin moves to n / 2
        assert_eq!(fftshift(arr.clone())[[2, 2]], 0.0);
        assert_eq!(ifftshift(arr)[[0, 0]], 10.0);
    }

    #[test]
    fn errors() {
        let empty = Array2::<f64>::zeros((0, 3));
        assert!(matches!(
            fourier_transform(&empty).unwrap_err().root(),
            Error::NotForged
        ));
    }
}

mod representations {
    use super::*;

    #[test]
    fn all_combinations() {
        let image = Array2::from_elem((16, 8), 10.0);
        let filter = Array2::from_elem((4, 4), 5.0);

        let image_ft = fourier_transform(&image).unwrap();
        let mut padded = Array2::<f64>::zeros((16, 8));
        padded.slice_mut(s![6..10, 2..6]).assign(&filter);
        let filter_ft = fourier_transform(&padded).unwrap();

        let image_before = image.clone();
        let mut output = Array2::<Complex<f64>>::zeros((16, 8));
        let ptr = output.as_ptr();

        for input_rep in [Representation::Spatial, Representation::Frequency] {
            for filter_rep in [Representation::Spatial, Representation::Frequency] {
                for output_rep in [Representation::Spatial, Representation::Frequency] {
                    let res = match (input_rep, filter_rep) {
                        (Representation::Spatial, Representation::Spatial) => convolve_ft_into(
                            &image, &filter, input_rep, filter_rep, output_rep, &[], &mut output,
                        ),
                        (Representation::Spatial, Representation::Frequency) => convolve_ft_into(
                            &image, &filter_ft, input_rep, filter_rep, output_rep, &[],
                            &mut output,
                        ),
                        (Representation::Frequency, Representation::Spatial) => convolve_ft_into(
                            &image_ft, &filter, input_rep, filter_rep, output_rep, &[],
                            &mut output,
                        ),
                        (Representation::Frequency, Representation::Frequency) => {
                            convolve_ft_into(
                                &image_ft, &filter_ft, input_rep, filter_rep, output_rep, &[],
                                &mut output,
                            )
                        }
                    };
                    res.unwrap();

                    let (index, expected) = match output_rep {
                        Representation::Spatial => ([3, 5], 800.0),
                        Representation::Frequency => ([8, 4], 102400.0),
                    };
                    let value = output[index];
                    assert!(
                        (value.re - expected).abs() < 1e-9 * expected && value.im.abs() < 1e-6,
                        "{:?}/{:?}/{:?}: {} vs {}",
                        input_rep,
                        filter_rep,
                        output_rep,
                        value,
                        expected
                    );
                    assert_eq!(output.as_ptr(), ptr, "output was reallocated");
                }
            }
        }

        assert_eq!(image, image_before);
    }

    #[test]
    fn parse() {
        assert_eq!(
            "frequency".parse::<Representation>().unwrap(),
            Representation::Frequency
        );
        assert!(matches!(
            "fourier".parse::<Representation>(),
            Err(Error::InvalidFlag(_))
        ));
    }
}

mod boundary_padding {
    use super::*;

    fn asymmetric_kernel() -> Array2<f64> {
        let mut kernel = Array2::zeros((4, 3));
        kernel.row_mut(1).fill(1.0);
        kernel.row_mut(3).fill(-1.0);
        kernel
    }

    #[test]
    fn matches_general_convolution() {
        let mut rng = StdRng::seed_from_u64(13);
        let image = Array::random_using((14, 7), Uniform::new(0., 100.), &mut rng);
        let kernel = asymmetric_kernel();
        let bc = [BoundaryCondition::AsymmetricMirror];

        let direct = general_convolution(&image, &kernel, &bc).unwrap();

        let real = convolve_ft_real(&image, &kernel, &bc).unwrap();
        assert_close(&real, &direct, TOLERANCE_F64);

        let complex = image
            .conv_ft(
                &kernel,
                Representation::Spatial,
                Representation::Spatial,
                Representation::Spatial,
                &bc,
            )
            .unwrap();
        assert_close(&complex.mapv(|c| c.re), &direct, TOLERANCE_F64);
    }

    #[test]
    fn single_precision() {
        let mut rng = StdRng::seed_from_u64(17);
        let image = Array::random_using((9, 12), Uniform::new(0u8, 255), &mut rng);
        let kernel = array![[1.0f32, 2.0, 1.0], [0.0, 0.0, 0.0], [-1.0, -2.0, -1.0]];
        let bc = [BoundaryCondition::ZeroOrderExtrapolate];

        let direct: Array2<f32> = general_convolution(&image, &kernel, &bc).unwrap();
        let fourier: Array2<f32> = image.conv_ft_real(&kernel, &bc).unwrap();
        direct.iter().zip(fourier.iter()).for_each(|(a, b)| {
            assert!((a - b).abs() < 2e-5 * a.abs().max(255.0), "{} vs {}", a, b);
        });
    }

    #[test]
    fn cross_method_periodic() {
        let mut rng = StdRng::seed_from_u64(29);
        let image = Array::random_using((80, 6, 5), Uniform::new(-1., 1.), &mut rng);
        let f = (0..19)
            .map(|i| (-((i as f64 - 9.0) / 4.0).powi(2)).exp())
            .collect::<Vec<_>>();
        let kernel = Array3::from_shape_vec((19, 1, 1), f.clone()).unwrap();
        let bc = [BoundaryCondition::Periodic];

        let separable = image
            .conv_separable(
                &[
                    OneDimensionalFilter::new(f),
                    OneDimensionalFilter::default(),
                    OneDimensionalFilter::default(),
                ],
                &bc,
                &[],
            )
            .unwrap();
        let direct = general_convolution(&image, &kernel, &bc).unwrap();
        let fourier = convolve_ft_real(&image, &kernel, &bc).unwrap();

        assert_close(&direct, &separable, TOLERANCE_F64);
        assert_close(&fourier, &separable, TOLERANCE_F64);
    }

    #[test]
    fn lower_dimensional_filter() {
        let mut rng = StdRng::seed_from_u64(31);
        let image = Array::random_using((10, 6), Uniform::new(-1., 1.), &mut rng);
        let filter = array![0.25, 0.5, 0.25];

        let fourier = convolve_ft_real(&image, &filter, &[BoundaryCondition::Periodic]).unwrap();
        let separable = image
            .conv_separable(
                &[OneDimensionalFilter::new(filter.to_vec()), OneDimensionalFilter::default()],
                &[BoundaryCondition::Periodic],
                &[],
            )
            .unwrap();
        assert_close(&fourier, &separable, TOLERANCE_F64);
    }

    #[test]
    fn real_operands_take_real_path() {
        let mut rng = StdRng::seed_from_u64(37);
        let image = Array::random_using((9, 7), Uniform::new(-1., 1.), &mut rng);
        let kernel = Array::random_using((3, 4), Uniform::new(-1., 1.), &mut rng);
        let spatial = Representation::Spatial;

        for bc in [&[][..], &[BoundaryCondition::SymmetricMirror][..]] {
            let complex = convolve_ft(&image, &kernel, spatial, spatial, spatial, bc).unwrap();
            let real = convolve_ft_real(&image, &kernel, bc).unwrap();
            assert!(complex.iter().all(|v| v.im == 0.0), "Imaginary residue with {:?}", bc);
            assert_eq!(complex.mapv(|v| v.re), real);
        }

        let complex_kernel = kernel.mapv(|k| Complex::new(k, 0.5));
        let mixed: Array2<Complex<f64>> =
            convolve_ft(&image, &complex_kernel, spatial, spatial, spatial, &[]).unwrap();
        assert!(mixed.iter().any(|v| v.im.abs() > 1e-3));
    }

    #[test]
    fn real_into_keeps_allocation() {
        let image = Array2::from_elem((6, 6), 1.0);
        let mut output = Array2::<f64>::zeros((6, 6));
        let ptr = output.as_ptr();
        convolve_ft_real_into(&image, &array![[1.0, 1.0]], &[], &mut output).unwrap();
        assert_eq!(output.as_ptr(), ptr);
        assert_close(&output, &Array2::from_elem((6, 6), 2.0), TOLERANCE_F64);

        let mut wrong = Array2::<f64>::zeros((2, 2));
        convolve_ft_real_into(&image, &array![[1.0, 1.0]], &[], &mut wrong).unwrap();
        assert_eq!(wrong.shape(), &[6, 6]);
    }
}

mod errors {
    use super::*;

    #[test]
    fn filter_too_large() {
        let image = Array2::<f64>::zeros((4, 4));
        let err = convolve_ft_real(&image, &Array2::<f64>::ones((5, 1)), &[]).unwrap_err();
        assert!(matches!(err.root(), Error::SizesDontMatch { .. }));
    }

    #[test]
    fn filter_more_dimensions() {
        let image = Array1::<f64>::zeros(8);
        let err = convolve_ft(
            &image,
            &Array2::<f64>::ones((1, 1)),
            Representation::Spatial,
            Representation::Spatial,
            Representation::Spatial,
            &[],
        )
        .unwrap_err();
        assert!(matches!(
            err.root(),
            Error::DimensionalitiesDontMatch {
                expected: 1,
                found: 2
            }
        ));
    }

    #[test]
    fn complex_filter_for_real_output() {
        let image = Array2::<f64>::zeros((4, 4));
        let filter = array![[Complex::new(1.0, 1.0)]];
        let err = convolve_ft_real(&image, &filter, &[]).unwrap_err();
        assert!(matches!(err.root(), Error::DataTypeNotSupported(_)));
    }

    #[test]
    fn output_untouched_on_error() {
        let image = Array2::<f64>::zeros((0, 4));
        let mut output = Array2::from_elem((3, 3), 7.0);
        let res = convolve_ft_real_into(&image, &array![[1.0]], &[], &mut output);
        assert!(matches!(res.unwrap_err().root(), Error::NotForged));
        assert_eq!(output, Array2::from_elem((3, 3), 7.0));
    }
}
