pub mod temperature {
    const KELVIN_OFFSET: f64 = 273.15;

    pub fn c2k(temp_c: f64) -> f64 {
        temp_c + KELVIN_OFFSET
    }

    pub fn c2f(temp_c: f64) -> f64 {
        temp_c * 9.0 / 5.0 + 32.0
    }

    pub fn c2c(temp_c: f64) -> f64 {
        temp_c
    }

    #[test]
    fn test_temperature() {
        assert_eq!(c2f(0.0), 32.0);
        assert_eq!(c2f(100.0), 212.0);
        assert_eq!(c2f(-40.0), -40.0);
        assert_eq!(c2k(0.0), 273.15);
        assert_eq!(c2k(-273.15), 0.0);
        assert_eq!(c2c(21.5), 21.5);
    }

    #[test]
    fn test_non_finite_passes_through() {
        assert!(c2k(f64::NAN).is_nan());
        assert!(c2f(f64::NAN).is_nan());
        assert_eq!(c2f(f64::INFINITY), f64::INFINITY);
        assert_eq!(c2k(f64::NEG_INFINITY), f64::NEG_INFINITY);
    }
}
