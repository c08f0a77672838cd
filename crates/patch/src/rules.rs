//! Per-title rules: device file names and the account id location.

/// NieR:Automata The End of YoRHa Edition.
pub const NIER_AUTOMATA_TITLE_ID: &str = "0100B8E016F76000";

/// Where the Steam account id lives inside a title's save files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountPatch {
    /// Files whose name contains this get the id at `marker_offset`.
    pub marker: &'static str,
    pub marker_offset: u64,
    pub default_offset: u64,
}

impl AccountPatch {
    pub fn offset_for(&self, file_name: &str) -> u64 {
        if file_name.contains(self.marker) {
            self.marker_offset
        } else {
            self.default_offset
        }
    }
}

/// Save handling for one title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TitleRule {
    pub title_id: &'static str,
    /// Extension (with dot) the PC release uses and the device does not.
    pub strip_extension: Option<&'static str>,
    pub account_patch: Option<AccountPatch>,
}

impl TitleRule {
    /// Name a local file gets on the device.
    pub fn device_name<'a>(&self, local_name: &'a str) -> &'a str {
        match self.strip_extension {
            Some(ext) => local_name.strip_suffix(ext).unwrap_or(local_name),
            None => local_name,
        }
    }

    /// Every device name that may hold a previous copy of `local_name`.
    pub fn device_names(&self, local_name: &str) -> Vec<String> {
        let stripped = self.device_name(local_name);
        if stripped == local_name {
            vec![local_name.to_string()]
        } else {
            vec![local_name.to_string(), stripped.to_string()]
        }
    }
}

const RULES: &[TitleRule] = &[TitleRule {
    title_id: NIER_AUTOMATA_TITLE_ID,
    strip_extension: Some(".dat"),
    account_patch: Some(AccountPatch {
        marker: "SlotData",
        marker_offset: 4,
        default_offset: 0,
    }),
}];

/// Looks up the rule for a title id, ignoring ASCII case.
pub fn rule_for(game_id: &str) -> Option<&'static TitleRule> {
    RULES
        .iter()
        .find(|rule| rule.title_id.eq_ignore_ascii_case(game_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nier_rule_lookup() {
        let rule = rule_for("0100b8e016f76000").unwrap();
        assert_eq!(rule.title_id, NIER_AUTOMATA_TITLE_ID);
        assert!(rule_for("0100000000010000").is_none());
    }

    #[test]
    fn strips_extension_for_device() {
        let rule = rule_for(NIER_AUTOMATA_TITLE_ID).unwrap();
        assert_eq!(rule.device_name("save1.dat"), "save1");
        assert_eq!(rule.device_name("save1"), "save1");
        assert_eq!(rule.device_name("notes.txt"), "notes.txt");
        assert_eq!(rule.device_names("save1.dat"), vec!["save1.dat", "save1"]);
        assert_eq!(rule.device_names("save1"), vec!["save1"]);
    }

    #[test]
    fn marker_selects_offset() {
        let patch = rule_for(NIER_AUTOMATA_TITLE_ID)
            .unwrap()
            .account_patch
            .unwrap();
        assert_eq!(patch.offset_for("SlotData_0.dat"), 4);
        assert_eq!(patch.offset_for("GameData.dat"), 0);
    }
}
