use crate::EngineError;
use dashu_base::Approximation;
use dashu_float::{DBig, FBig};
use serde::{Deserialize, Serialize};

/// Arbitrary precision floating point with explicit precision enforcement
///
/// Uses f64 internally when precision_bits <= 64, FBig otherwise.
/// This optimization is completely transparent to external code.
#[derive(Clone, Debug)]
pub struct BigFloat {
    value: BigFloatValue,
    precision_bits: usize,
}

#[derive(Clone, Debug)]
pub enum BigFloatValue {
    F64(f64),
    Arbitrary(FBig),
}

/// Widen an f64 to an FBig at the given precision.
///
/// Non-finite inputs have no FBig representation and collapse to zero.
fn fbig_from_f64(val: f64, precision_bits: usize) -> FBig {
    let base: FBig = if val == 0.0 {
        FBig::ZERO
    } else {
        FBig::try_from(val).unwrap_or(FBig::ZERO)
    };
    base.with_precision(precision_bits).value()
}

impl BigFloat {
    /// Create BigFloat from f64 with explicit precision
    ///
    /// NO DEFAULT - precision must always be specified
    pub fn with_precision(val: f64, precision_bits: usize) -> Self {
        let value = if precision_bits <= 64 {
            BigFloatValue::F64(val)
        } else {
            BigFloatValue::Arbitrary(fbig_from_f64(val, precision_bits))
        };

        Self {
            value,
            precision_bits,
        }
    }

    /// Create zero with explicit precision
    pub fn zero(precision_bits: usize) -> Self {
        Self::with_precision(0.0, precision_bits)
    }

    /// Get precision in bits
    pub fn precision_bits(&self) -> usize {
        self.precision_bits
    }

    /// Round to the nearest f64.
    /// May lose precision for values requiring > 64 bits
    pub fn to_f64(&self) -> f64 {
        match &self.value {
            BigFloatValue::F64(v) => *v,
            BigFloatValue::Arbitrary(v) => v.to_f64().value(),
        }
    }

    /// Create BigFloat from string with explicit precision
    ///
    /// Allows creating values beyond f64 range (e.g., "1e1000").
    /// Uses atomic base conversion with target precision to avoid precision loss.
    pub fn from_string(val: &str, precision_bits: usize) -> Result<Self, EngineError> {
        if precision_bits <= 64 {
            val.parse::<f64>()
                .map(|f| Self::with_precision(f, precision_bits))
                .map_err(|e| EngineError::Parse(format!("'{}' as f64: {}", val, e)))
        } else {
            let dbig = val
                .parse::<DBig>()
                .map_err(|e| EngineError::Parse(format!("'{}' as decimal: {}", val, e)))?;
            // Convert decimal -> binary in one rounding step at the target precision
            let fbig_halfaway = match dbig.with_base_and_precision::<2>(precision_bits) {
                Approximation::Exact(v) => v,
                Approximation::Inexact(v, _) => v,
            };
            let fbig = fbig_halfaway.with_rounding::<dashu_float::round::mode::Zero>();
            Ok(Self {
                value: BigFloatValue::Arbitrary(fbig),
                precision_bits,
            })
        }
    }

    /// Add two BigFloats, preserving max precision
    pub fn add(&self, other: &Self) -> Self {
        self.binary_op(other, |a, b| a + b, |a, b| a + b)
    }

    /// Subtract two BigFloats, preserving max precision
    pub fn sub(&self, other: &Self) -> Self {
        self.binary_op(other, |a, b| a - b, |a, b| a - b)
    }

    /// Multiply two BigFloats, preserving max precision
    pub fn mul(&self, other: &Self) -> Self {
        self.binary_op(other, |a, b| a * b, |a, b| a * b)
    }

    /// Divide two BigFloats, preserving max precision
    pub fn div(&self, other: &Self) -> Self {
        self.binary_op(other, |a, b| a / b, |a, b| a / b)
    }

    /// Multiply by two. Exact in both representations.
    pub fn double(&self) -> Self {
        self.add(self)
    }

    /// Square, the hot operation of every escape-time recurrence.
    pub fn square(&self) -> Self {
        self.mul(self)
    }

    fn binary_op(
        &self,
        other: &Self,
        f64_op: impl Fn(f64, f64) -> f64,
        big_op: impl Fn(&FBig, &FBig) -> FBig,
    ) -> Self {
        let result_precision = self.precision_bits.max(other.precision_bits);

        let value = match (&self.value, &other.value) {
            (BigFloatValue::F64(a), BigFloatValue::F64(b)) if result_precision <= 64 => {
                BigFloatValue::F64(f64_op(*a, *b))
            }
            _ => {
                let a_big = self.to_fbig(result_precision);
                let b_big = other.to_fbig(result_precision);
                BigFloatValue::Arbitrary(big_op(&a_big, &b_big))
            }
        };

        Self {
            value,
            precision_bits: result_precision,
        }
    }

    /// Convert to FBig for arbitrary precision operations
    fn to_fbig(&self, precision_bits: usize) -> FBig {
        match &self.value {
            BigFloatValue::F64(v) => fbig_from_f64(*v, precision_bits),
            BigFloatValue::Arbitrary(v) => v.clone(),
        }
    }
}

impl PartialEq for BigFloat {
    fn eq(&self, other: &Self) -> bool {
        match (&self.value, &other.value) {
            (BigFloatValue::F64(a), BigFloatValue::F64(b)) => a == b,
            _ => {
                let precision = self.precision_bits.max(other.precision_bits);
                self.to_fbig(precision) == other.to_fbig(precision)
            }
        }
    }
}

impl PartialOrd for BigFloat {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (&self.value, &other.value) {
            (BigFloatValue::F64(a), BigFloatValue::F64(b)) => a.partial_cmp(b),
            _ => {
                let precision = self.precision_bits.max(other.precision_bits);
                self.to_fbig(precision).partial_cmp(&other.to_fbig(precision))
            }
        }
    }
}

impl std::fmt::Display for BigFloat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            BigFloatValue::F64(v) => write!(f, "{}", v),
            BigFloatValue::Arbitrary(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct BigFloatSerde {
    value: String,
    precision_bits: usize,
}

impl Serialize for BigFloat {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let value_str = match &self.value {
            BigFloatValue::F64(v) => v.to_string(),
            BigFloatValue::Arbitrary(v) => v.to_string(),
        };

        BigFloatSerde {
            value: value_str,
            precision_bits: self.precision_bits,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BigFloat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let serde = BigFloatSerde::deserialize(deserializer)?;

        let value = if serde.precision_bits <= 64 {
            let f = serde
                .value
                .parse::<f64>()
                .map_err(|e| serde::de::Error::custom(format!("Failed to parse f64: {}", e)))?;
            BigFloatValue::F64(f)
        } else {
            let fbig = serde
                .value
                .parse::<FBig>()
                .map_err(|e| serde::de::Error::custom(format!("Failed to parse FBig: {}", e)))?;
            BigFloatValue::Arbitrary(fbig)
        };

        Ok(BigFloat {
            value,
            precision_bits: serde.precision_bits,
        })
    }
}
