//! Classification prompt.

use crate::config::Taxonomy;

/// Build the single user prompt sent for one email.
///
/// The taxonomy is embedded verbatim; the last two urgency levels get an
/// explicit disambiguation rule because models tend to conflate them.
pub fn build_classification_prompt(taxonomy: &Taxonomy, subject: &str, body: &str) -> String {
    let lowest = taxonomy.urgencies.last().map(String::as_str).unwrap_or("Trivial");
    let second_lowest = taxonomy
        .urgencies
        .iter()
        .rev()
        .nth(1)
        .map(String::as_str)
        .unwrap_or("Low");

    let mut prompt = String::with_capacity(1024 + subject.len() + body.len());

    prompt.push_str(
        "You are an internal email ticket triage system. Your goal is to classify \
         emails strictly and without bias.\n\n",
    );
    prompt.push_str("--- Key instructions ---\n");
    prompt.push_str(&format!(
        "1. **Clearly distinguish {lowest} from {second_lowest}.**\n"
    ));
    prompt.push_str(&format!(
        "2. Use '{lowest}' only for emails that require **NO human action at all** or that \
         are standard notifications with no negative impact (e.g. newsletter, \
         acknowledgement of receipt, successful maintenance notice, auto-reply, spam).\n"
    ));
    prompt.push_str(&format!(
        "3. Use '{second_lowest}' for anything that requires a future action but is not urgent.\n"
    ));
    prompt.push_str("---\n\n");

    prompt.push_str("Categories:\n");
    for category in &taxonomy.categories {
        prompt.push_str(&format!("- {category}\n"));
    }
    prompt.push_str("Urgency:\n");
    for urgency in &taxonomy.urgencies {
        prompt.push_str(&format!("- {urgency}\n"));
    }

    prompt.push_str("Answer with JSON only:\n");
    prompt.push_str("{\n  \"categorie\": \"\",\n  \"urgence\": \"\",\n  \"synthese\": \"\"\n}\n");
    prompt.push_str("Email:\n");
    prompt.push_str(&format!("Subject: {subject}\n"));
    prompt.push_str(&format!("Content: {body}\n"));

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_full_taxonomy() {
        let taxonomy = Taxonomy::default();
        let prompt = build_classification_prompt(&taxonomy, "s", "b");
        for label in taxonomy.categories.iter().chain(taxonomy.urgencies.iter()) {
            assert!(prompt.contains(label.as_str()), "missing {label}");
        }
    }

    #[test]
    fn prompt_disambiguates_two_lowest_levels() {
        let prompt = build_classification_prompt(&Taxonomy::default(), "s", "b");
        assert!(prompt.contains("distinguish Trivial from Low"));
        assert!(prompt.contains("Use 'Trivial' only"));
        assert!(prompt.contains("Use 'Low' for anything"));
    }

    #[test]
    fn prompt_asks_for_three_keys_and_includes_email() {
        let prompt = build_classification_prompt(
            &Taxonomy::default(),
            "VPN refuse ma connexion",
            "Depuis ce matin je ne peux plus me connecter.",
        );
        assert!(prompt.contains("\"categorie\""));
        assert!(prompt.contains("\"urgence\""));
        assert!(prompt.contains("\"synthese\""));
        assert!(prompt.contains("Subject: VPN refuse ma connexion"));
        assert!(prompt.contains("Content: Depuis ce matin"));
    }
}
