//! Access control for the assistant's company-scoped tools.
//!
//! An assistant deployment may be restricted to a subset of the group.
//! The grant is a list of short aliases; requests are matched loosely
//! so "consultores" still reaches an operator granted "SMD".

/// Full legal names for the short aliases an operator grants.
const COMPANY_LABELS: [(&str, &str); 22] = [
    ("365", "365 Receptión, S.L."),
    ("Alexan", "Alexan Events, S.L."),
    ("Arsgode", "Arsgode, S.L."),
    ("AssistantBot", "AssistantBot S.L."),
    ("Danomaclean", "Danomaclean SL"),
    ("Davila Property", "Davila Property Management S.L."),
    ("Dayful", "Dayful Studio S.L."),
    ("DSU", "Domotic Systems Unit S.L."),
    ("Gasmedia", "Gasmedia Systems, S.L."),
    ("Lucky Losers", "Lucky Losers Clothes, S.L."),
    ("Matches Padel", "Matches Padel Solutions S.L."),
    ("Menthor", "Menthor Padel Academy SL"),
    ("Padelbaycamp", "Padelbaycamp, S.L."),
    ("Padelmatches", "Padelmatches S.L."),
    ("Padelmunity", "Padelmunity, S.L."),
    ("Padelplay", "Padelplay 2022 S.L."),
    ("Padelprix", "Padelprix Worldwide, S.L."),
    ("Padel YVR", "Padel YVR S.L."),
    ("R2PRO", "R2PRO Nextgen, S.L."),
    ("Samarluan", "Samarluan S.L."),
    ("SMD", "SMD Consultores, S.L."),
    ("Viper", "Viper Web Tech, S.L."),
];

/// Legal name behind an alias, or the alias itself when unknown.
pub(crate) fn label_for(alias: &str) -> &str {
    COMPANY_LABELS.iter().find(|(key, _)| *key == alias).map_or(alias, |(_, label)| *label)
}

/// Legal names of every granted alias, comma separated.
pub(crate) fn allowed_labels(allowed: &[String]) -> String {
    allowed.iter().map(|alias| label_for(alias)).collect::<Vec<_>>().join(", ")
}

/// Whether `requested` falls inside the grant. An empty grant means
/// unrestricted access.
pub(crate) fn is_company_allowed(requested: &str, allowed: &[String]) -> bool {
    if allowed.is_empty() {
        return true;
    }
    let requested = requested.trim().to_lowercase();
    if requested.is_empty() {
        return false;
    }
    allowed.iter().any(|alias| {
        let label = label_for(alias).to_lowercase();
        let alias = alias.to_lowercase();
        requested == alias
            || requested.contains(&alias)
            || alias.contains(&requested)
            || label.contains(&requested)
    })
}
