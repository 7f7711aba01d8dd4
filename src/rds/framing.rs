//! Screen framing for the two RDS text services.
//!
//! Program Service (PS) shows exactly 8 characters at a time, so a line is cut
//! into 8 character screens and the last one is padded with spaces. RadioText
//! (RT) holds 32 or 64 characters; a shorter line is terminated with a carriage
//! return so receivers stop reading there, a longer one is cut.
//!
//! Lengths are counted in characters. Mapping characters onto the RDS character
//! table is the transmitter driver's job.

/// Characters on one PS screen.
pub const PS_SIZE: usize = 8;

/// Marks the end of a RadioText message shorter than the buffer.
pub const RT_END: char = '\r';

/// Cut `text` into PS screens. An empty line is one blank screen.
pub fn ps_fragments(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![" ".repeat(PS_SIZE)];
    }
    chars
        .chunks(PS_SIZE)
        .map(|chunk| {
            let mut screen: String = chunk.iter().collect();
            for _ in chunk.len()..PS_SIZE {
                screen.push(' ');
            }
            screen
        })
        .collect()
}

/// Fit `text` into a RadioText buffer of `size` characters.
pub fn rt_frame(text: &str, size: usize) -> String {
    let mut frame: String = text.chars().take(size).collect();
    if frame.chars().count() < size {
        frame.push(RT_END);
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ps_pads_short_line() {
        assert_eq!(ps_fragments("Merry"), vec!["Merry   "]);
    }

    #[test]
    fn test_ps_splits_long_line() {
        assert_eq!(
            ps_fragments("Silent Night"),
            vec!["Silent N", "ight    "]
        );
    }

    #[test]
    fn test_ps_exact_fit() {
        assert_eq!(ps_fragments("Christ-!"), vec!["Christ-!"]);
    }

    #[test]
    fn test_ps_empty_line_is_blank_screen() {
        assert_eq!(ps_fragments(""), vec!["        "]);
    }

    #[test]
    fn test_ps_counts_characters() {
        assert_eq!(ps_fragments("Noël"), vec!["Noël    "]);
    }

    #[test]
    fn test_rt_terminates_short_line() {
        assert_eq!(rt_frame("Silent Night", 32), "Silent Night\r");
    }

    #[test]
    fn test_rt_cuts_long_line() {
        let line = "x".repeat(40);
        assert_eq!(rt_frame(&line, 32), "x".repeat(32));
        assert_eq!(rt_frame(&line, 64), format!("{}\r", line));
    }
}
