//! 用于界面展示的粗略 token 估算
//!
//! These helpers never feed [`crate::ChatResponse::token_count`], which only carries what a
//! vendor reported.

/// Roughly four characters per token, rounded up.
///
/// # Examples
///
/// ```
/// use llm_switchboard::tokens::estimate_token_count;
///
/// assert_eq!(estimate_token_count(""), 0);
/// assert_eq!(estimate_token_count("hello"), 2);
/// ```
pub fn estimate_token_count(text: &str) -> u64 {
    (text.chars().count() as u64).div_ceil(4)
}

/// `"1.2k tokens"` from one thousand upwards, `"N tokens"` below.
///
/// Thousands keep one decimal, with halves rounded up (`1250` is `"1.3k tokens"`).
pub fn format_token_count(tokens: u64) -> String {
    if tokens >= 1000 {
        let tenths = (tokens + 50) / 100;
        format!("{}.{}k tokens", tenths / 10, tenths % 10)
    } else {
        format!("{tokens} tokens")
    }
}
