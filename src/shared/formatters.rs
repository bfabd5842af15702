//! Display formatting for wallet addresses, play time and cost readouts.

/// Shorten a wallet address to `prefix...suffix`.
///
/// Returns the address unchanged when it is shorter than
/// `prefix_len + suffix_len`, and an empty string for empty input.
pub fn format_address(address: &str, prefix_len: usize, suffix_len: usize) -> String {
    if address.is_empty() {
        return String::new();
    }

    let chars: Vec<char> = address.chars().collect();
    if chars.len() < prefix_len + suffix_len {
        return address.to_string();
    }

    let prefix: String = chars[..prefix_len].iter().collect();
    let suffix: String = chars[chars.len() - suffix_len..].iter().collect();
    format!("{}...{}", prefix, suffix)
}

/// Default wallet shortening (6 leading, 4 trailing characters)
pub fn short_address(address: &str) -> String {
    format_address(address, 6, 4)
}

/// Format elapsed seconds as `MM:SS`, or `H:MM:SS` past one hour.
pub fn format_play_time(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Format an accrued cost with three decimals.
pub fn format_cost(cost: f64) -> String {
    format!("{:.3}", cost)
}
