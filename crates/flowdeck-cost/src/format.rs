//! Number and currency formatting for usage figures.

/// Format a token count: `1.50B`, `2.25M`, `1.5K`, or the raw number.
pub fn format_tokens(tokens: u64) -> String {
    if tokens >= 1_000_000_000 {
        format!("{:.2}B", tokens as f64 / 1_000_000_000.0)
    } else if tokens >= 1_000_000 {
        format!("{:.2}M", tokens as f64 / 1_000_000.0)
    } else if tokens >= 1_000 {
        format!("{:.1}K", tokens as f64 / 1_000.0)
    } else {
        format!("{}", tokens)
    }
}

/// Format a dollar amount with two decimals.
pub fn format_usd(amount: f64) -> String {
    format!("${:.2}", amount)
}

/// Convert USD to BRL at `rate` and format it.
///
/// Renders `R$--` when the rate is not a usable number.
pub fn format_brl(amount_usd: f64, rate: f64) -> String {
    if !rate.is_finite() {
        return "R$--".to_string();
    }
    format!("R${:.2}", amount_usd * rate)
}

/// Exchange rate footer text.
pub fn format_rate(rate: f64) -> String {
    if rate.is_finite() {
        format!("1 USD = {:.2} BRL", rate)
    } else {
        "1 USD = -- BRL".to_string()
    }
}

/// Render a proportional bar of `width` cells.
pub fn render_bar(value: f64, max: f64, width: usize, filled_char: char, empty_char: char) -> String {
    let pct = if max > 0.0 {
        (value / max).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (pct * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);

    format!(
        "{}{}",
        filled_char.to_string().repeat(filled),
        empty_char.to_string().repeat(empty)
    )
}
