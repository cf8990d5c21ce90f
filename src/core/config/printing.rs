use crate::core::config::data::Config;

fn or_unset(value: Option<&str>) -> &str {
    value.unwrap_or("(unset)")
}

impl Config {
    pub fn render_all(&self) -> String {
        let mut lines = vec!["Current configuration:".to_string()];
        lines.push(format!("  model: {}", or_unset(self.model.as_deref())));
        lines.push(format!("  base-url: {}", or_unset(self.base_url.as_deref())));
        match &self.personality {
            Some(text) => {
                lines.push("  personality:".to_string());
                lines.extend(text.lines().map(|line| format!("    {line}")));
            }
            None => lines.push("  personality: (default)".to_string()),
        }
        match (&self.currency_code, self.currency_rate) {
            (None, None) => lines.push("  currency: (unset)".to_string()),
            _ => {
                let currency = self.display_currency();
                lines.push(format!("  currency: {} at {}", currency.code, currency.rate));
            }
        }
        if self.pricing.is_empty() {
            lines.push("  pricing: (built-in only)".to_string());
        } else {
            lines.push("  pricing:".to_string());
            for entry in &self.pricing {
                lines.push(format!(
                    "    {}: ${} in / ${} out per million tokens",
                    entry.model, entry.input_per_million, entry.output_per_million
                ));
            }
        }
        lines.join("\n")
    }

    pub fn print_all(&self) {
        println!("{}", self.render_all());
    }
}
