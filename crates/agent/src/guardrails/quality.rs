use tracing::debug;

/// Pictographic blocks counted as decoration: misc symbols and dingbats plus
/// the supplementary emoji planes.
const PICTOGRAPH_RANGES: &[(u32, u32)] = &[(0x2600, 0x27BF), (0x1F300, 0x1FAFF)];

/// Last check before a reply is delivered: rejects blank, too-short and
/// mostly-emoji replies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QualityGate {
    min_chars: usize,
}

impl QualityGate {
    pub fn new(min_chars: usize) -> Self {
        Self { min_chars }
    }

    pub fn min_chars(&self) -> usize {
        self.min_chars
    }

    pub fn is_acceptable(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }

        let chars = text.chars().count();
        if chars < self.min_chars {
            debug!(event_name = "agent.quality.too_short", chars, "reply below quality length");
            return false;
        }

        let pictographs = text.chars().filter(|ch| is_pictograph(*ch)).count();
        if pictographs > chars / 2 {
            debug!(
                event_name = "agent.quality.excess_emoji",
                pictographs,
                chars,
                "reply is mostly emoji"
            );
            return false;
        }

        true
    }
}

impl Default for QualityGate {
    fn default() -> Self {
        Self::new(20)
    }
}

fn is_pictograph(ch: char) -> bool {
    let code = u32::from(ch);
    PICTOGRAPH_RANGES.iter().any(|(start, end)| (*start..=*end).contains(&code))
}

#[cfg(test)]
mod tests {
    use super::QualityGate;

    #[test]
    fn rejects_blank_and_short_replies() {
        let gate = QualityGate::default();
        assert!(!gate.is_acceptable(""));
        assert!(!gate.is_acceptable("    \n"));
        assert!(!gate.is_acceptable("Hola!"));
        assert!(!gate.is_acceptable("Claro, con gusto."));
    }

    #[test]
    fn accepts_plain_reply_at_threshold() {
        let gate = QualityGate::new(20);
        let reply = "Tenemos tres sedanes";
        assert_eq!(reply.chars().count(), 20);
        assert!(gate.is_acceptable(reply));
    }

    #[test]
    fn counts_chars_not_bytes() {
        // Twenty chars, more than twenty bytes.
        let reply = "¿Qué año te gustaría";
        assert_eq!(reply.chars().count(), 20);
        assert!(QualityGate::default().is_acceptable(reply));
        assert!(!QualityGate::default().is_acceptable("¿Qué año te gustarí"));
    }

    #[test]
    fn rejects_mostly_emoji_replies() {
        let gate = QualityGate::default();
        assert!(!gate.is_acceptable("😀😀😀😀😀😀😀😀😀😀😀😀🚗🚗🚗🚗🚗🚗 ok"));
        assert!(!gate.is_acceptable("☀☀☀☀☀☀☀☀☀☀☀☀☀☀☀☀☀☀ sol"));
    }

    #[test]
    fn tolerates_a_few_emoji() {
        let gate = QualityGate::default();
        assert!(gate.is_acceptable("¡Claro! Tenemos ese modelo disponible 🚗😀"));
    }
}
