//! Platform-id parsing and display formatting.
//!
//! Member ids come in two shapes: `<digits>@c.us` (a real phone number) and
//! `<digits>@lid` (an opaque internal id the platform hands out when the
//! phone is hidden). Group ids look like `<digits>@g.us`.

/// Digits of a phone-shaped id, `None` for opaque ids and anything else.
pub fn raw_phone(member_id: &str) -> Option<&str> {
    if member_id.ends_with("@lid") {
        return None;
    }
    let (prefix, _) = member_id.split_once('@')?;
    if !prefix.is_empty() && prefix.bytes().all(|b| b.is_ascii_digit()) {
        Some(prefix)
    } else {
        None
    }
}

/// Human-readable form of a member id.
///
/// Opaque ids show their last six digits; 11-digit phones get the
/// `+X (XXX) XXX-XX-XX` grouping used across KZ/RU numbers; other phones just
/// gain a `+`. Anything unparseable passes through verbatim.
pub fn display_id(member_id: &str) -> String {
    if member_id.ends_with("@lid") {
        // Raw ids are normally all digits, but nothing guarantees that;
        // count chars rather than bytes so odd ids can't split a char.
        let prefix = member_id.split('@').next().unwrap_or("");
        let skip = prefix.chars().count().saturating_sub(6);
        let tail: String = prefix.chars().skip(skip).collect();
        return format!("ID: {tail}");
    }

    let Some(phone) = raw_phone(member_id) else {
        return member_id.to_string();
    };

    if phone.len() == 11 {
        format!(
            "+{} ({}) {}-{}-{}",
            &phone[0..1],
            &phone[1..4],
            &phone[4..7],
            &phone[7..9],
            &phone[9..11]
        )
    } else {
        format!("+{phone}")
    }
}

/// Short display form of a group id (the part before `@`).
pub fn short_group(group_id: &str) -> &str {
    group_id.split('@').next().unwrap_or(group_id)
}

/// Direct-message deep link for a phone-shaped id.
pub fn direct_message_link(member_id: &str) -> Option<String> {
    let phone = raw_phone(member_id)?;
    Some(format!("https://api.whatsapp.com/send?phone={phone}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_kz_phone() {
        assert_eq!(display_id("77011234567@c.us"), "+7 (701) 123-45-67");
    }

    #[test]
    fn formats_opaque_id_with_tail() {
        assert_eq!(display_id("208361782014140@lid"), "ID: 014140");
    }

    #[test]
    fn formats_non_ascii_opaque_id_without_panicking() {
        assert_eq!(display_id("aéaaaaa@lid"), "ID: éaaaaa");
        assert_eq!(display_id("é@lid"), "ID: é");
    }

    #[test]
    fn short_phone_gets_plus_prefix() {
        assert_eq!(display_id("155501234@c.us"), "+155501234");
    }

    #[test]
    fn unparseable_id_passes_through() {
        assert_eq!(display_id("not-a-phone"), "not-a-phone");
    }

    #[test]
    fn raw_phone_rejects_opaque_ids() {
        assert_eq!(raw_phone("208361782014140@lid"), None);
        assert_eq!(raw_phone("77011234567@c.us"), Some("77011234567"));
    }

    #[test]
    fn group_short_form() {
        assert_eq!(short_group("120363424613797548@g.us"), "120363424613797548");
    }

    #[test]
    fn dm_link_only_for_phones() {
        assert_eq!(
            direct_message_link("77011234567@c.us").as_deref(),
            Some("https://api.whatsapp.com/send?phone=77011234567")
        );
        assert_eq!(direct_message_link("208361782014140@lid"), None);
    }
}
