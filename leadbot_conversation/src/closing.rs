/// Decides whether an assistant reply ends the conversation.
pub trait ClosingDetector: Send + Sync {
    fn is_closing(&self, reply: &str) -> bool;
}

impl<F> ClosingDetector for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_closing(&self, reply: &str) -> bool {
        self(reply)
    }
}

/// Case-insensitive substring match against a fixed phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerPhrase {
    marker: String,
}

impl MarkerPhrase {
    #[must_use]
    pub fn new(marker: impl AsRef<str>) -> Self {
        Self {
            marker: marker.as_ref().trim().to_lowercase(),
        }
    }

    #[must_use]
    pub fn marker(&self) -> &str {
        &self.marker
    }
}

impl Default for MarkerPhrase {
    fn default() -> Self {
        Self::new("especialista entrará em contato")
    }
}

impl ClosingDetector for MarkerPhrase {
    fn is_closing(&self, reply: &str) -> bool {
        !self.marker.is_empty() && reply.to_lowercase().contains(&self.marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_marker_case_insensitively() {
        let detector = MarkerPhrase::default();

        assert!(detector.is_closing(
            "Obrigada, Marina! Um especialista entrará em contato em breve 😊"
        ));
        assert!(detector.is_closing("UM ESPECIALISTA ENTRARÁ EM CONTATO AMANHÃ"));
        assert!(!detector.is_closing("Olá! Qual é o seu nome? 😊"));
        assert!(!detector.is_closing("Um especialista vai ligar"));
    }

    #[test]
    fn marker_is_normalized() {
        let detector = MarkerPhrase::new("  Obrigado ");
        assert_eq!(detector.marker(), "obrigado");
        assert!(detector.is_closing("Muito obrigado pelo contato!"));
    }

    #[test]
    fn empty_marker_never_closes() {
        assert!(!MarkerPhrase::new("   ").is_closing("qualquer coisa"));
    }

    #[test]
    fn closures_are_detectors() {
        let detector = |reply: &str| reply.ends_with("tchau");
        assert!(detector.is_closing("até logo, tchau"));
        assert!(!ClosingDetector::is_closing(&detector, "oi"));
    }
}
