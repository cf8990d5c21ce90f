use crate::core::config::Config;

/// Lists every priced model, marking `current_model`.
pub fn list_pricing(config: &Config, current_model: &str) -> String {
    let table = config.pricing_table();
    let width = table
        .iter()
        .map(|(model, _)| model.len())
        .max()
        .unwrap_or(0);

    let mut out = String::from("💰 Model prices (USD per million tokens)\n");
    for (model, pricing) in table.iter() {
        let marker = if model.eq_ignore_ascii_case(current_model) {
            '*'
        } else {
            ' '
        };
        out.push_str(&format!(
            "{marker} {model:<width$}  in {:>8.2}  out {:>8.2}\n",
            pricing.input_per_million(),
            pricing.output_per_million()
        ));
    }

    if table.get(current_model).is_none() {
        out.push_str(&format!("⚠️  No price for the current model '{current_model}'\n"));
    }

    let currency = config.display_currency();
    out.push_str(&format!(
        "Display currency: {} at {} per USD\n",
        currency.code, currency.rate
    ));
    out
}
