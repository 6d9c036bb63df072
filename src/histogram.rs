use crate::error::{DbError, DbResult};
use crate::predicate::Op;

/// Equi-width histogram over the integer domain `[min, max]`, used to
/// estimate the selectivity of a comparison predicate without scanning
/// the underlying table. `num_buckets` buckets evenly divide the range;
/// each `add_value` call increments the bucket the value falls in.
pub struct IntHistogram {
    buckets: Vec<u32>,
    min: i32,
    max: i32,
    bucket_width: f64,
    num_tuples: u32,
}

impl IntHistogram {
    pub fn new(num_buckets: usize, min: i32, max: i32) -> Self {
        let num_buckets = num_buckets.max(1);
        // w = max(1, ceil((max - min + 1) / num_buckets)), per the spec's
        // integer-width bucketization rather than a plain float division.
        let bucket_width = ((max - min + 1) as f64 / num_buckets as f64).ceil().max(1.0);
        IntHistogram {
            buckets: vec![0; num_buckets],
            min,
            max,
            bucket_width,
            num_tuples: 0,
        }
    }

    fn bucket_index(&self, v: i32) -> usize {
        let idx = ((v - self.min) as f64 / self.bucket_width).floor() as isize;
        idx.clamp(0, self.buckets.len() as isize - 1) as usize
    }

    /// Increments the bucket containing `v`. Fails with `OutOfRange` if
    /// `v` falls outside `[min, max]` — callers that don't know a value's
    /// range ahead of time (e.g. a two-pass table scan) must size the
    /// histogram from an observed min/max first.
    pub fn add_value(&mut self, v: i32) -> DbResult<()> {
        if v < self.min || v > self.max {
            return Err(DbError::OutOfRange {
                value: v,
                min: self.min,
                max: self.max,
            });
        }
        let idx = self.bucket_index(v);
        self.buckets[idx] += 1;
        self.num_tuples += 1;
        Ok(())
    }

    /// Fraction of tuples expected to satisfy `v <op> value`, in `[0, 1]`.
    pub fn estimate_selectivity(&self, op: Op, v: i32) -> f64 {
        if self.num_tuples == 0 {
            return 0.0;
        }
        match op {
            Op::Equals => self.estimate_equals(v),
            Op::NotEquals => 1.0 - self.estimate_equals(v),
            Op::GreaterThan => self.estimate_greater_than(v),
            Op::LessThanOrEq => 1.0 - self.estimate_greater_than(v),
            Op::LessThan => self.estimate_less_than(v),
            Op::GreaterThanOrEq => self.estimate_greater_than(v) + self.estimate_equals(v),
        }
    }

    fn estimate_less_than(&self, v: i32) -> f64 {
        if v <= self.min {
            return 0.0;
        }
        if v > self.max {
            return 1.0;
        }
        let idx = self.bucket_index(v);
        let bucket_start = self.min as f64 + idx as f64 * self.bucket_width;
        let fraction_below = ((v as f64 - bucket_start) / self.bucket_width).clamp(0.0, 1.0);
        let within_bucket = self.buckets[idx] as f64 * fraction_below;
        let full_buckets: u32 = self.buckets[..idx].iter().sum();
        (full_buckets as f64 + within_bucket) / self.num_tuples as f64
    }

    fn estimate_equals(&self, v: i32) -> f64 {
        if v < self.min || v > self.max {
            return 0.0;
        }
        let idx = self.bucket_index(v);
        (self.buckets[idx] as f64 / self.bucket_width.max(1.0)) / self.num_tuples as f64
    }

    fn estimate_greater_than(&self, v: i32) -> f64 {
        1.0 - self.estimate_less_than(v) - self.estimate_equals(v)
    }

    pub fn avg_selectivity(&self) -> f64 {
        if self.num_tuples == 0 {
            return 1.0;
        }
        self.buckets
            .iter()
            .map(|&count| {
                let frac = count as f64 / self.num_tuples as f64;
                frac * frac
            })
            .sum::<f64>()
            .sqrt()
    }
}

const STRING_HISTOGRAM_BUCKETS: usize = 100;
const MAX_STRING_CODE: i32 = i32::MAX;
const MIN_STRING_CODE: i32 = 0;

/// String selectivity estimation by folding each string down to an
/// integer via its leading characters and delegating to a fixed
/// 100-bucket `IntHistogram` over that derived domain.
pub struct StringHistogram {
    inner: IntHistogram,
}

impl StringHistogram {
    pub fn new() -> Self {
        StringHistogram {
            inner: IntHistogram::new(STRING_HISTOGRAM_BUCKETS, MIN_STRING_CODE, MAX_STRING_CODE),
        }
    }

    /// Folds up to the first 4 characters of `s` into a big-endian
    /// ordered integer, so that lexicographic string order maps to
    /// integer order (needed for range predicates to estimate sanely).
    fn string_to_code(s: &str) -> i32 {
        let mut code: i64 = 0;
        let chars: Vec<char> = s.chars().take(4).collect();
        for i in 0..4 {
            code <<= 8;
            if let Some(c) = chars.get(i) {
                code |= *c as i64 & 0xff;
            }
        }
        // shift into non-negative i32 range so bucket math stays simple
        (code >> 1).clamp(MIN_STRING_CODE as i64, MAX_STRING_CODE as i64) as i32
    }

    pub fn add_value(&mut self, s: &str) {
        // `string_to_code` always folds into [MIN_STRING_CODE, MAX_STRING_CODE],
        // the exact range this histogram was constructed over, so it can
        // never be out of range.
        self.inner.add_value(Self::string_to_code(s)).unwrap();
    }

    pub fn estimate_selectivity(&self, op: Op, s: &str) -> f64 {
        self.inner.estimate_selectivity(op, Self::string_to_code(s))
    }

    pub fn avg_selectivity(&self) -> f64 {
        self.inner.avg_selectivity()
    }
}

impl Default for StringHistogram {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_distribution_equality_selectivity() {
        let mut h = IntHistogram::new(10, 0, 99);
        for v in 0..100 {
            h.add_value(v).unwrap();
        }
        let sel = h.estimate_selectivity(Op::Equals, 42);
        assert!((sel - 0.01).abs() < 0.005);
    }

    #[test]
    fn out_of_range_greater_than_is_zero_or_one() {
        let mut h = IntHistogram::new(10, 0, 99);
        for v in 0..100 {
            h.add_value(v).unwrap();
        }
        assert_eq!(h.estimate_selectivity(Op::GreaterThan, 1000), 0.0);
        assert_eq!(h.estimate_selectivity(Op::LessThan, -1000), 0.0);
    }

    #[test]
    fn greater_than_and_less_than_or_eq_are_complementary() {
        let mut h = IntHistogram::new(5, 0, 49);
        for v in 0..50 {
            h.add_value(v).unwrap();
        }
        let gt = h.estimate_selectivity(Op::GreaterThan, 20);
        let lte = h.estimate_selectivity(Op::LessThanOrEq, 20);
        assert!((gt + lte - 1.0).abs() < 1e-9);
    }

    #[test]
    fn string_histogram_preserves_lexicographic_order() {
        let mut h = StringHistogram::new();
        for s in ["apple", "banana", "cherry", "date", "fig"] {
            h.add_value(s);
        }
        let sel_low = h.estimate_selectivity(Op::LessThan, "cherry");
        let sel_high = h.estimate_selectivity(Op::GreaterThan, "cherry");
        assert!(sel_low > 0.0);
        assert!(sel_high > 0.0);
    }

    #[test]
    fn add_value_out_of_range_is_rejected() {
        let mut h = IntHistogram::new(10, 1, 100);
        for v in 1..=100 {
            h.add_value(v).unwrap();
        }
        assert_eq!(h.estimate_selectivity(Op::Equals, 50), 0.01);
        assert!((h.estimate_selectivity(Op::LessThan, 50) - 0.49).abs() < 0.01);
        assert!((h.estimate_selectivity(Op::GreaterThan, 50) - 0.50).abs() < 0.01);
        assert!((h.estimate_selectivity(Op::NotEquals, 50) - 0.99).abs() < 1e-9);
        assert_eq!(h.estimate_selectivity(Op::LessThan, 0), 0.0);
        assert_eq!(h.estimate_selectivity(Op::GreaterThan, 0), 1.0);

        assert!(matches!(
            h.add_value(0),
            Err(DbError::OutOfRange { value: 0, min: 1, max: 100 })
        ));
        assert!(matches!(h.add_value(101), Err(DbError::OutOfRange { .. })));
    }
}
