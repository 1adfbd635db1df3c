//! Finiteness helpers: every float leaving the pipeline is either finite or absent.

/// Keep a value only when it is a finite float.
#[inline]
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Drop non-finite values from an optional float.
#[inline]
pub fn finite_opt(value: Option<f64>) -> Option<f64> {
    value.and_then(finite)
}

/// Arithmetic mean of the defined, finite values; `None` when there are none.
pub fn mean_defined<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    use statrs::statistics::Statistics;

    let defined: Vec<f64> = values.into_iter().filter_map(finite_opt).collect();
    if defined.is_empty() {
        return None;
    }
    finite(defined.mean())
}

/// Median of the defined, finite values; `None` when there are none.
pub fn median_defined<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    use statrs::statistics::{Data, Median};

    let defined: Vec<f64> = values.into_iter().filter_map(finite_opt).collect();
    if defined.is_empty() {
        return None;
    }
    finite(Data::new(defined).median())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finite_rejects_nan_and_infinity() {
        assert_eq!(finite(1.5), Some(1.5));
        assert_eq!(finite(f64::NAN), None);
        assert_eq!(finite(f64::INFINITY), None);
        assert_eq!(finite(f64::NEG_INFINITY), None);
        assert_eq!(finite_opt(None), None);
    }

    #[test]
    fn test_mean_skips_undefined() {
        let mean = mean_defined([Some(1.0), None, Some(3.0), Some(f64::NAN)]);
        assert!((mean.unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_mean_of_nothing_is_none() {
        assert_eq!(mean_defined([None, None]), None);
        assert_eq!(mean_defined(Vec::<Option<f64>>::new()), None);
    }

    #[test]
    fn test_median_even_and_odd() {
        let odd = median_defined([Some(5.0), Some(1.0), Some(3.0)]).unwrap();
        assert!((odd - 3.0).abs() < 1e-12);
        let even = median_defined([Some(4.0), Some(1.0), Some(2.0), Some(3.0), None]).unwrap();
        assert!((even - 2.5).abs() < 1e-12);
    }
}
