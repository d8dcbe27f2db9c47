//! Prompt templates.
//!
//! Both prompts are pure functions of the rendered transcript; the builder
//! only carries the persona name and the developments it may suggest.

/// Renders the per-turn and extraction prompts.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    persona_name: String,
    developments: Vec<String>,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            persona_name: "Heloísa".to_string(),
            developments: vec![
                "Residencial Vista do Vale".to_string(),
                "Torres do Atlântico".to_string(),
            ],
        }
    }
}

impl PromptBuilder {
    #[must_use]
    pub const fn new(persona_name: String, developments: Vec<String>) -> Self {
        Self {
            persona_name,
            developments,
        }
    }

    /// Suggestion sentence for step 3, empty when no developments are set.
    fn development_hint(&self) -> String {
        match self.developments.as_slice() {
            [] => String::new(),
            [only] => format!(" Sugira, por exemplo, o \"{only}\"."),
            [init @ .., last] => {
                let quoted: Vec<String> = init.iter().map(|d| format!("\"{d}\"")).collect();
                format!(
                    " Sugira algumas opções como {} ou \"{last}\" para facilitar.",
                    quoted.join(", ")
                )
            }
        }
    }

    /// Persona, ordered objectives and rules, followed by the transcript.
    #[must_use]
    pub fn build_turn_prompt(&self, transcript: &str) -> String {
        let persona = &self.persona_name;
        let hint = self.development_hint();

        format!(
            r"Você é {persona}, uma consultora especialista da nossa construtora de alto padrão. Sua personalidade é carismática, atenciosa e muito humana. Você NUNCA soa como um robô.

Seu objetivo é ter uma conversa amigável e natural para conhecer o cliente e entender seus interesses. Conduza o diálogo passo a passo, fazendo UMA PERGUNTA POR VEZ.

**FLUXO DA CONVERSA:**
1. Apresente-se de forma calorosa e pergunte o nome do cliente.
2. Depois de obter o nome, pergunte o melhor email para contato.
3. Em seguida, pergunte qual dos nossos empreendimentos desperta o interesse do cliente.{hint}
4. Com nome, email e interesse em mãos, agradeça de forma personalizada e diga que um especialista entrará em contato em breve com todos os detalhes.

**REGRAS:**
- Respostas curtas, amigáveis e conversacionais. Use emojis sutis (😊, 👋) quando parecer natural.
- NUNCA forneça preços, condições de pagamento ou detalhes técnicos. Sua função é apenas o primeiro contato.
- Se o cliente fizer uma pergunta, responda antes de continuar o fluxo.

**HISTÓRICO DA CONVERSA ATUAL:**
{transcript}
**Sua resposta (curta e amigável):**
"
        )
    }

    /// JSON-only request for `name`, `email` and `interest`.
    #[must_use]
    pub fn build_extraction_prompt(&self, transcript: &str) -> String {
        let persona = &self.persona_name;

        format!(
            r#"Analise o histórico abaixo, entre {persona} e um cliente, e extraia os dados do cliente.

Responda SOMENTE com um objeto JSON, sem nenhum texto antes ou depois, exatamente neste formato:
{{"name": "nome do cliente", "email": "email do cliente", "interest": "empreendimento de interesse"}}

Use null para qualquer campo que o cliente não tenha informado.

**HISTÓRICO DA CONVERSA:**
{transcript}"#
        )
    }
}
