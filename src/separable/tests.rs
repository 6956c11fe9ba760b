use super::filter::Taps;
use super::*;
use ndarray::prelude::*;
use ndarray_rand::{
    rand::{rngs::StdRng, SeedableRng},
    rand_distr::Uniform,
    RandomExt,
};
use num::Complex;

const TOLERANCE_F64: f64 = 1e-12;

fn random_image(shape: (usize, usize, usize), seed: u64) -> Array3<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array::random_using(shape, Uniform::new(-1., 1.), &mut rng)
}

fn assert_close<T: ConvNum, D: Dimension>(a: &Array<T, D>, b: &Array<T, D>, tolerance: f64)
where
    T::Real: Into<f64>,
{
    assert_eq!(a.shape(), b.shape(), "Shape mismatch");
    a.iter()
        .zip(b.iter())
        .enumerate()
        .for_each(|(idx, (&x, &y))| {
            let diff: f64 = (x - y).modulus().into();
            let scale: f64 = x.modulus().into();
            assert!(
                diff <= tolerance * scale.max(1.0),
                "Mismatch at index {}: {:?} vs {:?}, diff={:e}",
                idx,
                x,
                y,
                diff
            );
        });
}

mod normalizer {
    use super::*;

    #[test]
    fn general_is_reversed() {
        let f = CanonicalFilter::<f64>::new(&OneDimensionalFilter::new(vec![1., 2., 3.])).unwrap();
        assert_eq!(f.taps, Taps::General(vec![3., 2., 1.]));
        assert_eq!(f.size, 3);
        assert_eq!(f.origin, 1);

        let f = CanonicalFilter::<f64>::new(&OneDimensionalFilter::new(vec![1., 2., 3.]).with_origin(0))
            .unwrap();
        assert_eq!(f.origin, 2);
        assert_eq!(f.border(), 2);
    }

    #[test]
    fn symmetric_sizes() {
        let f = CanonicalFilter::<f64>::new(
            &OneDimensionalFilter::new(vec![1., 2., 3.]).with_symmetry(FilterSymmetry::Even),
        )
        .unwrap();
        assert_eq!(f.size, 5);
        assert_eq!(f.origin, 2);
        assert_eq!(
            f.taps,
            Taps::Even {
                center: 3.,
                taps: vec![2., 1.]
            }
        );

        let f = CanonicalFilter::<f64>::new(
            &OneDimensionalFilter::new(vec![1., 2.]).with_symmetry(FilterSymmetry::DOdd),
        )
        .unwrap();
        assert_eq!(f.size, 4);
        // default origin 4 / 2 = 2, reversed 4 - 2 - 1 = 1
        assert_eq!(f.origin, 1);
        assert_eq!(f.taps, Taps::DOdd(vec![2., 1.]));
    }

    #[test]
    fn conj_degrades_for_real_data() {
        let f = CanonicalFilter::<f32>::new(
            &OneDimensionalFilter::new(vec![1f32, 2.]).with_symmetry(FilterSymmetry::Conj),
        )
        .unwrap();
        assert!(matches!(f.taps, Taps::Even { .. }));

        let f = CanonicalFilter::<f32>::new(
            &OneDimensionalFilter::new(vec![1f32, 2.]).with_symmetry(FilterSymmetry::DConj),
        )
        .unwrap();
        assert!(matches!(f.taps, Taps::DEven(_)));
    }

    #[test]
    fn invalid_descriptors() {
        let res = CanonicalFilter::<f64>::new(
            &OneDimensionalFilter::new(vec![1., 2., 3.])
                .with_symmetry(FilterSymmetry::Even)
                .with_origin(5),
        );
        assert!(matches!(res, Err(Error::InvalidArgument(_))));

        let complex = OneDimensionalFilter::from_interleaved(&[1., 0., 0., 1.]).unwrap();
        assert_eq!(complex.filter, vec![Complex::new(1., 0.), Complex::new(0., 1.)]);
        assert!(matches!(
            CanonicalFilter::<f64>::new(&complex),
            Err(Error::InvalidArgument(_))
        ));

        assert!(matches!(
            OneDimensionalFilter::from_interleaved(&[1., 0., 2.]),
            Err(Error::InvalidArgument(_))
        ));

        assert!(matches!(
            "symmetric".parse::<FilterSymmetry>(),
            Err(Error::InvalidFlag(_))
        ));
        assert_eq!(
            "d-conj".parse::<FilterSymmetry>().unwrap(),
            FilterSymmetry::DConj
        );
    }

    #[test]
    fn meaningless() {
        let identity = |f: OneDimensionalFilter<f64>| {
            CanonicalFilter::<f64>::new(&f).unwrap().is_meaningless()
        };

        assert!(identity(OneDimensionalFilter::default()));
        assert!(identity(OneDimensionalFilter::new(vec![1.])));
        assert!(identity(
            OneDimensionalFilter::new(vec![1.]).with_symmetry(FilterSymmetry::Odd)
        ));
        assert!(!identity(OneDimensionalFilter::new(vec![2.])));
        assert!(!identity(
            OneDimensionalFilter::new(vec![1.]).with_symmetry(FilterSymmetry::DEven)
        ));
    }
}

mod line_filter {
    use super::*;

    #[test]
    fn derivative_periodic() {
        let arr = array![1., 2., 3., 4., 5.];
        let general = arr
            .conv_separable(
                &[OneDimensionalFilter::new(vec![1., 0., -1.])],
                &[BoundaryCondition::Periodic],
                &[],
            )
            .unwrap();
        assert_eq!(general, array![-3., 2., 2., 2., -3.]);

        let odd = arr
            .conv_separable(
                &[OneDimensionalFilter::new(vec![1., 0.]).with_symmetry(FilterSymmetry::Odd)],
                &[BoundaryCondition::Periodic],
                &[],
            )
            .unwrap();
        assert_eq!(odd, general);
    }

    #[test]
    fn box_asymmetric_mirror() {
        let arr = array![1., 2., 3.];
        let res = arr
            .conv_separable(
                &[OneDimensionalFilter::new(vec![1., 1.]).with_symmetry(FilterSymmetry::Even)],
                &[BoundaryCondition::AsymmetricMirror],
                &[],
            )
            .unwrap();
        assert_eq!(res, array![2., 6., 2.]);
    }

    #[test]
    fn explicit_origin_shifts() {
        let arr = array![0., 0., 1., 0., 0., 0.];
        let res = arr
            .conv_separable(
                &[OneDimensionalFilter::new(vec![1., 2., 3.]).with_origin(0)],
                &[BoundaryCondition::AddZeros],
                &[],
            )
            .unwrap();
        // the impulse response starts at the impulse
        assert_eq!(res, array![0., 0., 1., 2., 3., 0.]);
    }
}

mod symmetry_equivalence {
    use super::*;

    fn check(half: Vec<f64>, symmetry: FilterSymmetry, full: Vec<f64>) {
        let img = random_image((17, 9, 6), 7);
        let expanded = img
            .conv_separable(
                &[OneDimensionalFilter::new(full)],
                &[BoundaryCondition::Periodic],
                &[],
            )
            .unwrap();
        let symmetric = img
            .conv_separable(
                &[OneDimensionalFilter::new(half).with_symmetry(symmetry)],
                &[BoundaryCondition::Periodic],
                &[],
            )
            .unwrap();
        assert_close(&expanded, &symmetric, TOLERANCE_F64);
    }

    #[test]
    fn single_sided() {
        check(vec![0.25, 0.5], FilterSymmetry::Even, vec![0.25, 0.5, 0.25]);
        check(
            vec![1., 2., 0.5],
            FilterSymmetry::Odd,
            vec![1., 2., 0.5, -2., -1.],
        );
        check(vec![3., -1.], FilterSymmetry::Conj, vec![3., -1., 3.]);
    }

    #[test]
    fn doubled() {
        check(
            vec![1., 2., 3.],
            FilterSymmetry::DEven,
            vec![1., 2., 3., 3., 2., 1.],
        );
        check(
            vec![1., 2., 3.],
            FilterSymmetry::DOdd,
            vec![1., 2., 3., -3., -2., -1.],
        );
    }

    #[test]
    fn complex_conjugate() {
        let img = random_image((12, 5, 4), 11);
        let c0 = Complex::new(0.5, 0.25);
        let c1 = Complex::new(-1.0, 2.0);

        let cases = [
            (FilterSymmetry::Conj, vec![c0, c1, c0.conj()]),
            (FilterSymmetry::DConj, vec![c0, c1, c1.conj(), c0.conj()]),
        ];
        for (symmetry, full) in cases {
            let expanded = img
                .conv_separable(
                    &[OneDimensionalFilter::new(full)],
                    &[BoundaryCondition::SymmetricMirror],
                    &[],
                )
                .unwrap();
            let symmetric = img
                .conv_separable(
                    &[OneDimensionalFilter::new(vec![c0, c1]).with_symmetry(symmetry)],
                    &[BoundaryCondition::SymmetricMirror],
                    &[],
                )
                .unwrap();
            assert_close(&expanded, &symmetric, TOLERANCE_F64);
        }
    }
}

mod driver {
    use super::*;

    #[test]
    fn meaningless_filter_is_identity() {
        let mut rng = StdRng::seed_from_u64(3);
        let img = Array::random_using((13, 4), Uniform::new(-5f32, 5.), &mut rng);
        let res = img
            .conv_separable(&[OneDimensionalFilter::new(vec![1.0f32])], &[], &[])
            .unwrap();
        assert_eq!(res, img);
    }

    #[test]
    fn process_flags() {
        let img = random_image((8, 7, 3), 5);
        let f = OneDimensionalFilter::new(vec![1., 2., 1.]);

        let flagged = img
            .conv_separable(&[f.clone()], &[], &[false, true, false])
            .unwrap();
        let explicit = img
            .conv_separable(
                &[
                    OneDimensionalFilter::default(),
                    f,
                    OneDimensionalFilter::default(),
                ],
                &[],
                &[],
            )
            .unwrap();
        assert_eq!(flagged, explicit);
    }

    #[test]
    fn shared_filter() {
        let img = random_image((6, 5, 4), 9);
        let f = OneDimensionalFilter::new(vec![0.5, 0.25]).with_symmetry(FilterSymmetry::Even);
        let shared = img
            .conv_separable(&[f.clone()], &[BoundaryCondition::ZeroOrderExtrapolate], &[])
            .unwrap();
        let per_dim = img
            .conv_separable(
                &[f.clone(), f.clone(), f],
                &[BoundaryCondition::ZeroOrderExtrapolate],
                &[],
            )
            .unwrap();
        assert_eq!(shared, per_dim);
    }

    #[test]
    fn integer_input_is_promoted() {
        let img = array![[1u8, 2, 3], [4, 5, 6]];
        let res: Array2<f32> = img
            .conv_separable(
                &[OneDimensionalFilter::new(vec![1.0f64, 1.0])],
                &[BoundaryCondition::AddZeros],
                &[true, false],
            )
            .unwrap();
        // origin 1: out[i] = in[i] + in[i + 1]
        assert_eq!(res, array![[5f32, 7., 9.], [4., 5., 6.]]);

        let res: Array2<Complex<f32>> = img
            .conv_separable(&[OneDimensionalFilter::new(vec![Complex::new(0.0f64, 1.0)])], &[], &[])
            .unwrap();
        assert_eq!(res[[1, 2]], Complex::new(0., 6.));
    }

    #[test]
    fn errors() {
        let empty = Array2::<f64>::zeros((0, 3));
        let err = empty
            .conv_separable(&[OneDimensionalFilter::new(vec![1., 2.])], &[], &[])
            .unwrap_err();
        assert!(matches!(err.root(), Error::NotForged));

        let img = random_image((4, 4, 4), 1);
        let f = OneDimensionalFilter::new(vec![1., 2.]);
        let err = img
            .conv_separable(&[f.clone(), f.clone()], &[], &[])
            .unwrap_err();
        assert!(matches!(
            err.root(),
            Error::ArrayParameterWrongLength {
                expected: 3,
                found: 2
            }
        ));

        let err = img.conv_separable(&[f], &[], &[true]).unwrap_err();
        assert!(matches!(err.root(), Error::ArrayParameterWrongLength { .. }));
    }
}
