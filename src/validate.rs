//! Comparison of results across number formats and against the accelerator.
use crate::ledger::Ledger;
use crate::numeric::{Decimal, Numeric};
use crate::Result;
use std::io::Write;

pub const REPORT_HEADER: &str = "name,dE_f,dE_p,dE_hw,\
    log(abs(dE_f)),log(abs(dE_p)),log(abs(dE_hw)),\
    E,E_f,E_p,E_hw,da_F,da_P,da_HW";

/// `(other - exact) / exact`, or zero when `exact` is zero.
pub fn relative_error(exact: &Decimal, other: &Decimal) -> Decimal {
    if exact.is_zero() {
        Decimal::zero()
    } else {
        (other.clone() - exact.clone()) / exact.clone()
    }
}

/// Number of correct decimal digits of `other`, i.e. `-log10(|log10(other / exact)|)`.
///
/// NaN if either value is NaN or they have opposite signs, `+inf` if they are
/// equal, `-inf` if exactly one of them is zero or exactly one is infinite.
pub fn accuracy(exact: &Decimal, other: &Decimal) -> f64 {
    if exact.is_nan() || other.is_nan() || exact.signum() * other.signum() < 0 {
        f64::NAN
    } else if exact == other {
        f64::INFINITY
    } else if exact.is_zero() != other.is_zero() || exact.is_infinite() != other.is_infinite() {
        f64::NEG_INFINITY
    } else {
        let error = relative_error(exact, other).to_f64();
        // log10(1 + e) loses every digit of a small e when computed directly.
        let digits = if error.abs() < 0.5 {
            error.ln_1p() / std::f64::consts::LN_10
        } else {
            (other.clone() / exact.clone()).log10_abs()
        };
        -digits.abs().log10()
    }
}

/// One format's value of a result, measured against the exact value.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub value: Decimal,
    pub relative_error: Decimal,
    pub accuracy: f64,
}

impl Comparison {
    pub fn new(exact: &Decimal, value: Decimal) -> Self {
        Self {
            relative_error: relative_error(exact, &value),
            accuracy: accuracy(exact, &value),
            value,
        }
    }
    /// log10(|relative error|).
    pub fn log_error(&self) -> f64 {
        self.relative_error.log10_abs()
    }
}

#[derive(Debug, Clone)]
pub struct ReportRow {
    pub name: String,
    pub exact: Decimal,
    pub fast: Comparison,
    pub posit: Comparison,
    pub hardware: Comparison,
}

impl std::fmt::Display for ReportRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (fast, posit, hw) = (&self.fast, &self.posit, &self.hardware);
        write!(f, "{},", self.name)?;
        write!(f, "{},{},{},", fast.relative_error, posit.relative_error, hw.relative_error)?;
        write!(f, "{},{},{},", fast.log_error(), posit.log_error(), hw.log_error())?;
        write!(f, "{},{},{},{},", self.exact, fast.value, posit.value, hw.value)?;
        write!(f, "{},{},{}", fast.accuracy, posit.accuracy, hw.accuracy)
    }
}

/// Which ledger lacked an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerKind {
    Fast,
    Posit,
    Hardware,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingEntry {
    pub name: String,
    pub ledger: LedgerKind,
}

#[derive(Debug, Clone, Default)]
pub struct Validation {
    pub rows: Vec<ReportRow>,
    pub missing: Vec<MissingEntry>,
}

impl Validation {
    pub fn write_report<W: Write>(&self, wtr: &mut W) -> Result<()> {
        writeln!(wtr, "{}", REPORT_HEADER)?;
        for row in self.rows.iter() {
            writeln!(wtr, "{}", row)?;
        }
        Ok(())
    }
    /// Mean of the finite accuracies of the (fast, posit, hardware) columns.
    pub fn mean_accuracy(&self) -> (f64, f64, f64) {
        fn mean<I: Iterator<Item = f64>>(xs: I) -> f64 {
            let (sum, count) = xs
                .filter(|x| x.is_finite())
                .fold((0f64, 0), |(sum, count), x| (sum + x, count + 1));
            sum / count as f64
        }
        (
            mean(self.rows.iter().map(|r| r.fast.accuracy)),
            mean(self.rows.iter().map(|r| r.posit.accuracy)),
            mean(self.rows.iter().map(|r| r.hardware.accuracy)),
        )
    }
}

/// Compares every result of the exact ledger with the other three.
/// A name missing from any of them is reported and its row left out.
pub fn validate<F: Numeric, P: Numeric, H: Numeric>(
    exact: &Ledger<Decimal>,
    fast: &Ledger<F>,
    posit: &Ledger<P>,
    hardware: &Ledger<H>,
) -> Validation {
    let mut validation = Validation::default();
    for (name, value) in exact.iter() {
        let values = (fast.get(name), posit.get(name), hardware.get(name));
        let (f, p, h) = match values {
            (Some(f), Some(p), Some(h)) => (f, p, h),
            _ => {
                let absent = [
                    (LedgerKind::Fast, values.0.is_none()),
                    (LedgerKind::Posit, values.1.is_none()),
                    (LedgerKind::Hardware, values.2.is_none()),
                ];
                for (ledger, _) in absent.iter().copied().filter(|&(_, absent)| absent) {
                    warn!("{} is missing from the {:?} results", name, ledger);
                    let name = name.to_string();
                    validation.missing.push(MissingEntry { name, ledger });
                }
                continue;
            }
        };
        validation.rows.push(ReportRow {
            name: name.to_string(),
            exact: value.clone(),
            fast: Comparison::new(value, f.to_decimal()),
            posit: Comparison::new(value, p.to_decimal()),
            hardware: Comparison::new(value, h.to_decimal()),
        });
    }
    validation
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ErrorCount {
    pub checked: usize,
    pub violations: usize,
}

/// Counts results whose ratio `software / hardware` leaves `[1 - margin, 1 + margin]`.
/// Identical results are always within tolerance, zeros included.
/// A result the accelerator did not produce counts as a violation, as does NaN.
pub fn count_errors<T: Numeric>(
    software: &Ledger<T>,
    hardware: &Ledger<T>,
    margin: f64,
) -> ErrorCount {
    let (lower, upper) = (T::from_f64(1.0 - margin), T::from_f64(1.0 + margin));
    let mut count = ErrorCount::default();
    for (name, sw) in software.iter() {
        count.checked += 1;
        let hw = match hardware.get(name) {
            Some(hw) => hw,
            None => {
                warn!("{}\tSW:{:?}\tHW:missing", name, sw);
                count.violations += 1;
                continue;
            }
        };
        if !sw.is_nan() && sw == hw {
            continue;
        }
        let ratio = sw.clone() / hw.clone();
        // NaN fails both comparisons.
        if !(lower <= ratio && ratio <= upper) {
            warn!("{}\tSW:{:?}\tHW:{:?}\tratio:{}", name, sw, hw, ratio);
            count.violations += 1;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{fill_batch, ProbabilityModel, SequenceSource, SynthConfig};
    use crate::forward::ForwardEngine;
    use crate::ledger::result_name;
    use crate::numeric::Posit32;
    use crate::workload::Geometry;
    use approx::assert_abs_diff_eq;
    fn d(x: f64) -> Decimal {
        Decimal::from_f64(x)
    }
    #[test]
    fn accuracy_edge_cases() {
        for &x in &[1.0, -3.5, 0.0, 1e-300, f64::INFINITY] {
            assert_eq!(accuracy(&d(x), &d(x)), f64::INFINITY, "{}", x);
        }
        assert_eq!(accuracy(&d(1.0), &d(0.0)), f64::NEG_INFINITY);
        assert_eq!(accuracy(&d(0.0), &d(1.0)), f64::NEG_INFINITY);
        assert_eq!(accuracy(&d(1.0), &d(f64::INFINITY)), f64::NEG_INFINITY);
        assert!(accuracy(&d(1.0), &d(-1.0)).is_nan());
        assert!(accuracy(&d(f64::NAN), &d(1.0)).is_nan());
        assert!(accuracy(&d(1.0), &d(f64::NAN)).is_nan());
        assert!(accuracy(&d(f64::NAN), &d(f64::NAN)).is_nan());
    }
    #[test]
    fn accuracy_counts_digits() {
        let digits = accuracy(&d(1.0), &d(1.0 + 1e-7));
        let expected = -(1e-7f64.ln_1p() / std::f64::consts::LN_10).log10();
        assert_abs_diff_eq!(digits, expected, epsilon = 1e-6);
        assert_abs_diff_eq!(digits, 7.362, epsilon = 1e-3);
        // Far off values.
        let digits = accuracy(&d(1.0), &d(1e10));
        assert_abs_diff_eq!(digits, -1.0, epsilon = 1e-12);
        let digits = accuracy(&d(1e-200), &d(1e-190));
        assert_abs_diff_eq!(digits, -1.0, epsilon = 1e-9);
        // Better approximations score higher.
        let exact = d(1.0) / d(3.0);
        let single = accuracy(&exact, &d((1.0f32 / 3.0) as f64));
        let double = accuracy(&exact, &d(1.0 / 3.0));
        assert!(6.0 < single && single < 9.0, "{}", single);
        assert!(15.0 < double && double < 18.0, "{}", double);
    }
    #[test]
    fn relative_errors() {
        assert_eq!(relative_error(&d(0.0), &d(5.0)), d(0.0));
        assert_eq!(relative_error(&d(2.0), &d(3.0)), d(0.5));
        assert_eq!(relative_error(&d(-2.0), &d(-1.0)), d(-0.5));
        assert!(relative_error(&d(2.0), &d(f64::NAN)).is_nan());
    }
    #[test]
    fn report_rows_and_missing_entries() {
        let names: Vec<_> = (0..3).map(|lane| result_name(0, lane)).collect();
        let exact: Ledger<Decimal> = names.iter().map(|n| (n.clone(), d(0.5))).collect();
        let fast: Ledger<f32> = names.iter().map(|n| (n.clone(), 0.5)).collect();
        let posit: Ledger<Posit32> = names
            .iter()
            .map(|n| (n.clone(), Posit32::from_f64(0.25)))
            .collect();
        let hardware: Ledger<Posit32> = names
            .iter()
            .take(2)
            .map(|n| (n.clone(), Posit32::from_f64(0.5)))
            .collect();
        let validation = validate(&exact, &fast, &posit, &hardware);
        assert_eq!(validation.rows.len(), 2);
        assert_eq!(
            validation.missing,
            vec![MissingEntry {
                name: "result[0][2]".to_string(),
                ledger: LedgerKind::Hardware,
            }]
        );
        let row = &validation.rows[1];
        assert_eq!(row.name, "result[0][1]");
        assert_eq!(row.fast.accuracy, f64::INFINITY);
        assert_eq!(row.posit.relative_error, d(-0.5));
        assert_abs_diff_eq!(row.posit.accuracy, -(0.301f64.log10()), epsilon = 1e-3);
        let mut wtr = vec![];
        validation.write_report(&mut wtr).unwrap();
        let text = String::from_utf8(wtr).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], REPORT_HEADER);
        let columns = REPORT_HEADER.split(',').count();
        assert!(lines[1..].iter().all(|l| l.split(',').count() == columns));
        assert!(lines[1].starts_with("result[0][0],0,-0.5,0,"), "{}", lines[1]);
        let (fast, _, hw) = validation.mean_accuracy();
        assert!(fast.is_nan() && hw.is_nan());
    }
    #[test]
    fn error_counting() {
        let names: Vec<_> = (0..16).map(|lane| result_name(0, lane)).collect();
        let values: Vec<_> = (0..16).map(|i| Posit32::from_f64(0.001 * (i + 1) as f64)).collect();
        let software: Ledger<Posit32> = names.iter().cloned().zip(values.iter().copied()).collect();
        let count = count_errors(&software, &software, crate::ERROR_MARGIN);
        assert_eq!(count, ErrorCount { checked: 16, violations: 0 });
        let perturbed: Ledger<Posit32> = names
            .iter()
            .cloned()
            .zip(values.iter().copied())
            .enumerate()
            .map(|(i, (n, v))| match i {
                7 => (n, v * Posit32::from_f64(1.001)),
                _ => (n, v),
            })
            .collect();
        let count = count_errors(&software, &perturbed, crate::ERROR_MARGIN);
        assert_eq!(count, ErrorCount { checked: 16, violations: 1 });
        let partial: Ledger<Posit32> = names
            .iter()
            .skip(1)
            .cloned()
            .zip(values.iter().copied())
            .collect();
        assert_eq!(count_errors(&software, &partial, crate::ERROR_MARGIN).violations, 16);
        let nar: Ledger<Posit32> = names.iter().cloned().map(|n| (n, Posit32::NAR)).collect();
        assert_eq!(count_errors(&software, &nar, crate::ERROR_MARGIN).violations, 16);
        assert_eq!(count_errors(&nar, &nar, crate::ERROR_MARGIN).violations, 16);
        // Exactly equal zeros agree.
        let zeros: Ledger<Posit32> = names.iter().cloned().map(|n| (n, Posit32::ZERO)).collect();
        let count = count_errors(&zeros, &zeros.clone(), crate::ERROR_MARGIN);
        assert_eq!(count, ErrorCount { checked: 16, violations: 0 });
        let zeros: Ledger<f32> = names.iter().cloned().map(|n| (n, 0.0)).collect();
        assert_eq!(count_errors(&zeros, &zeros.clone(), crate::ERROR_MARGIN).violations, 0);
        let ones: Ledger<f32> = names.iter().cloned().map(|n| (n, 1.0)).collect();
        assert_eq!(count_errors(&zeros, &ones, crate::ERROR_MARGIN).violations, 16);
    }
    #[test]
    fn zero_seed_results_agree() {
        let config = SynthConfig::new(
            0.0,
            SequenceSource::Random { seed: 5 },
            ProbabilityModel::Random { seed: 5 },
        );
        let batches = vec![fill_batch(0, Geometry::new(6, 10), &config)];
        let software = ForwardEngine::<Posit32>::default().calculate(&batches);
        assert!(software.iter().all(|(_, x)| x.is_zero()));
        let count = count_errors(&software, &software.clone(), crate::ERROR_MARGIN);
        assert_eq!(count, ErrorCount { checked: 16, violations: 0 });
        // Empty reads sum to zero as well.
        let batches = vec![fill_batch(0, Geometry::new(0, 16), &config)];
        let software = ForwardEngine::<f32>::default().calculate(&batches);
        let count = count_errors(&software, &software.clone(), crate::ERROR_MARGIN);
        assert_eq!(count, ErrorCount { checked: 16, violations: 0 });
    }
    #[test]
    fn report_errors_surface() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }
        let validation = Validation::default();
        assert!(matches!(
            validation.write_report(&mut Broken),
            Err(crate::PairHmmError::Io(_))
        ));
    }
}
