/// Typed interpretation of the `C` record's run-control words
use log::warn;

use crate::error::ControlError;
use crate::model::ControlBlock;

/// Run-control parameters for the view-factor engine
#[derive(Debug, Clone, PartialEq)]
pub struct ControlParams {
    /// Convergence limit for adaptive integration
    pub eps: f64,
    /// Diagnostic listing level
    pub list: u32,
    /// Output file format, 0..=2
    pub out_format: u32,
    /// Surfaces form a closed enclosure
    pub enclosure: bool,
    /// Apply emittances to the results
    pub emittances: bool,
    pub max_recursion_unobstructed: u32,
    pub max_recursion: u32,
    pub min_recursion: u32,
    pub row: u32,
    pub col: u32,
    pub reverse_projection: bool,
    pub max_vertices: Option<u32>,
}

impl Default for ControlParams {
    fn default() -> Self {
        Self {
            eps: 1.0e-4,
            list: 0,
            out_format: 0,
            enclosure: false,
            emittances: false,
            max_recursion_unobstructed: 12,
            max_recursion: 8,
            min_recursion: 0,
            row: 0,
            col: 0,
            reverse_projection: false,
            max_vertices: None,
        }
    }
}

impl ControlParams {
    /// Interpret a control block, starting from the defaults.
    ///
    /// Control words are matched case-insensitively. Unknown words and
    /// out-of-range recursion limits are logged, not rejected.
    pub fn from_block(block: &ControlBlock) -> Result<Self, ControlError> {
        let mut params = Self::default();

        for (key, value) in block.iter() {
            match key.to_ascii_lowercase().as_str() {
                "eps" => {
                    let eps = float(key, value)?;
                    if eps < 0.99e-6 {
                        warn!("convergence limit {} < 1.0e-6", eps);
                    }
                    if eps > 1.0e-2 {
                        warn!("convergence limit {} > 1.0e-2", eps);
                    }
                    params.eps = eps;
                }
                "list" => params.list = uint(key, value)?,
                "out" => {
                    let out = int(key, value)?;
                    if !(0..=2).contains(&out) {
                        return Err(ControlError::InvalidOutFormat(out));
                    }
                    params.out_format = u32::try_from(out)
                        .map_err(|_| ControlError::InvalidOutFormat(out))?;
                }
                "encl" => params.enclosure = int(key, value)? != 0,
                "emit" => params.emittances = int(key, value)? != 0,
                "maxu" => params.max_recursion_unobstructed = recursion_limit(key, value)?,
                "maxo" => params.max_recursion = recursion_limit(key, value)?,
                "mino" => {
                    let min = uint(key, value)?;
                    if min > 2 {
                        warn!("minimum obstructed recursions {} may be too large", min);
                    }
                    params.min_recursion = min;
                }
                "row" => params.row = uint(key, value)?,
                "col" => params.col = uint(key, value)?,
                "prjd" => params.reverse_projection = int(key, value)? != 0,
                "maxv" => params.max_vertices = Some(uint(key, value)?),
                _ => warn!("invalid control word '{}'", key),
            }
        }

        if params.col != 0 && params.row == 0 {
            return Err(ControlError::ColumnWithoutRow);
        }
        Ok(params)
    }
}

fn int(key: &str, value: &str) -> Result<i64, ControlError> {
    value.parse().map_err(|_| bad_value(key, value, "integer"))
}

/// Non-negative count; negatives clamp to zero, values past `u32::MAX` are rejected.
fn uint(key: &str, value: &str) -> Result<u32, ControlError> {
    let n = int(key, value)?.max(0);
    u32::try_from(n).map_err(|_| bad_value(key, value, "integer"))
}

fn bad_value(key: &str, value: &str, expected: &'static str) -> ControlError {
    ControlError::BadValue {
        key: key.to_string(),
        value: value.to_string(),
        expected,
    }
}

fn float(key: &str, value: &str) -> Result<f64, ControlError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| bad_value(key, value, "float"))
}

fn recursion_limit(key: &str, value: &str) -> Result<u32, ControlError> {
    let mut limit = uint(key, value)?;
    if limit < 4 {
        warn!("maximum recursions for '{}' reset to 4", key);
        limit = 4;
    }
    if limit > 12 {
        warn!("maximum recursions for '{}' may be too large", key);
    }
    Ok(limit)
}
