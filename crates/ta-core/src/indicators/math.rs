//! Scalar step functions shared by the reference indicators and the device kernels.
//!
//! Every recurrence in the engine goes through these helpers so the sequential
//! reference and the per-thread kernels execute the same f32 operations in the
//! same order. Changing an expression here changes both sides at once.

/// Clamp a raw length parameter to a usable window (`< 1` becomes 1).
#[inline]
pub fn clamp_length(length: i32) -> usize {
    if length < 1 {
        1
    } else {
        length as usize
    }
}

/// Clamp a band multiplier: non-finite or negative widths become 0.
#[inline]
pub fn clamp_width(width: f32) -> f32 {
    if width.is_finite() && width > 0.0 {
        width
    } else {
        0.0
    }
}

/// Wilder smoothing in running-sum form: `avg - avg / L + x`.
#[inline]
pub fn wilder_step(avg: f32, x: f32, length: f32) -> f32 {
    avg - avg / length + x
}

/// SMMA recurrence: `(prev * (L - 1) + x) / L`.
#[inline]
pub fn smma_step(prev: f32, x: f32, length: f32) -> f32 {
    (prev * (length - 1.0) + x) / length
}

/// EMA smoothing factor `2 / (L + 1)`.
#[inline]
pub fn ema_alpha(length: f32) -> f32 {
    2.0 / (length + 1.0)
}

/// EMA recurrence: `(x - prev) * k + prev`.
#[inline]
pub fn ema_step(prev: f32, x: f32, k: f32) -> f32 {
    (x - prev) * k + prev
}

/// Running-sum update when `old` leaves the window and `new` enters it.
#[inline]
pub fn rolling_sum_step(sum: f32, old: f32, new: f32) -> f32 {
    sum - old + new
}

/// `num / den * 100`.
#[inline]
pub fn percent_of(num: f32, den: f32) -> f32 {
    num / den * 100.0
}

/// True range against the previous close; without one it is the bar range.
#[inline]
pub fn true_range(high: f32, low: f32, prev_close: Option<f32>) -> f32 {
    match prev_close {
        Some(pc) => (high - low).max((high - pc).abs()).max((low - pc).abs()),
        None => high - low,
    }
}

/// (+DM, -DM) from consecutive bars.
#[inline]
pub fn directional_movement(high: f32, low: f32, prev_high: f32, prev_low: f32) -> (f32, f32) {
    let up_move = high - prev_high;
    let down_move = prev_low - low;
    let plus_dm = if up_move > down_move && up_move > 0.0 {
        up_move
    } else {
        0.0
    };
    let minus_dm = if down_move > up_move && down_move > 0.0 {
        down_move
    } else {
        0.0
    };
    (plus_dm, minus_dm)
}

/// Directional index from the two DI lines; 0 when both are 0.
#[inline]
pub fn dx_from_di(plus_di: f32, minus_di: f32) -> f32 {
    let sum = plus_di + minus_di;
    if sum > 0.0 {
        percent_of((plus_di - minus_di).abs(), sum)
    } else {
        0.0
    }
}

/// RSI from smoothed gain/loss. Flat input reads 50, loss-free input reads 100.
#[inline]
pub fn rsi_from_averages(avg_gain: f32, avg_loss: f32) -> f32 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            50.0
        } else {
            100.0
        }
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    }
}

/// Aroon line from the age of the extremum inside a window of `length` bars.
#[inline]
pub fn aroon_line(length: f32, age: u32) -> f32 {
    percent_of(length - age as f32, length)
}
