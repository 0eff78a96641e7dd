//! Shorthand names users type for the companies of the group.
//!
//! Keys are lowercased aliases, values are a fragment of the legal
//! name as registered in the ERP. The fragment is matched as a
//! substring of the directory name, so it survives suffix changes
//! like `S.L.` versus `SL`.

pub(crate) const COMPANY_ALIASES: &[(&str, &str)] = &[
    ("samarluan", "samarluan"),
    ("mps", "matches padel solutions"),
    ("matches padel", "matches padel solutions"),
    ("matches", "matches padel solutions"),
    ("pm", "padelmatches"),
    ("padelmatches", "padelmatches"),
    ("padel matches", "padelmatches"),
    ("smd", "smd consultores"),
    ("smd consultores", "smd consultores"),
    ("smd asesores", "smd consultores"),
    ("viper", "viper web tech"),
    ("dpm", "davila property management"),
    ("davila property", "davila property management"),
    ("dsu", "domotic systems unit"),
    ("gasmedia", "gasmedia systems"),
    ("lucky losers", "lucky losers clothes"),
    ("padelprix", "padelprix worldwide"),
    ("menthor", "menthor padel academy"),
    ("r2pro", "r2pro nextgen"),
    ("alexan", "alexan events"),
    ("dayful", "dayful studio"),
    ("365", "365 receptión"),
    ("receptión", "365 receptión"),
    ("recepcion", "365 receptión"),
    ("padelplay", "padelplay 2022"),
    ("padel play", "padelplay 2022"),
    ("baycamp", "padelbaycamp"),
    ("padelbaycamp", "padelbaycamp"),
    ("yvr", "padel yvr"),
    ("padel yvr", "padel yvr"),
    ("arsgode", "arsgode"),
    ("danomaclean", "danomaclean"),
    ("padelmunity", "padelmunity"),
    ("assistantbot", "assistantbot"),
    ("grupo", "grupo"),
];

/// Looks up the search fragment for an already-lowercased alias.
pub(crate) fn alias_target(term: &str) -> Option<&'static str> {
    COMPANY_ALIASES.iter().find(|(alias, _)| *alias == term).map(|(_, target)| *target)
}
