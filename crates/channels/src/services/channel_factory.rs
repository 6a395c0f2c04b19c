//! Builds channel attributes from raw form fields.

use channeldesk_database::{Channel, ChannelAttributes, ChannelGroup, ChannelKind};
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::types::ChannelForm;
use crate::utils::{ChannelPolicy, ValidationErrors, Validator};

const NAME_MAX_CHARS: usize = 255;

/// Which group the built channel belongs to. The caller resolves and
/// authorizes the group before building.
#[derive(Debug, Clone, Copy)]
pub enum GroupAssignment<'a> {
    /// Keep the prior channel's group (none on create).
    Unchanged,
    Ungrouped,
    Group(&'a ChannelGroup),
}

/// Turns a [`ChannelForm`] into validated [`ChannelAttributes`].
pub struct ChannelFactory;

impl ChannelFactory {
    /// Build the attributes of a new channel (`prior` is `None`) or of an
    /// updated one. Fields missing from the form keep their prior values.
    pub fn build(
        form: &ChannelForm,
        prior: Option<&Channel>,
        actor_id: i64,
        group: GroupAssignment<'_>,
    ) -> Result<ChannelAttributes, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = text(&form.name, prior.map(|c| c.name.clone()));
        match &name {
            None => errors.add("name", "can't be blank"),
            Some(name) if name.chars().count() > NAME_MAX_CHARS => errors.add(
                "name",
                format!("is too long (maximum is {} characters)", NAME_MAX_CHARS),
            ),
            Some(_) => {}
        }

        let kind = match form.kind.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            Some(tag) => match tag.parse::<ChannelKind>() {
                Ok(kind) => Some(kind),
                Err(_) => {
                    errors.add("type", "is not included in the list");
                    None
                }
            },
            None => {
                let prior_kind = prior.map(|c| c.kind);
                if prior_kind.is_none() {
                    errors.add("type", "can't be blank");
                }
                prior_kind
            }
        };

        let keyword = text(&form.keyword, prior.and_then(|c| c.keyword.clone()));
        if let Some(keyword) = &keyword {
            if !Validator::keyword(keyword) {
                errors.add("keyword", "must be a single word");
            }
        }

        let tparty_keyword = text(&form.tparty_keyword, prior.and_then(|c| c.tparty_keyword.clone()));
        if let Some(tparty_keyword) = &tparty_keyword {
            if !Validator::tparty_keyword(tparty_keyword) {
                errors.add("tparty_keyword", "must be a phone number or short code");
            }
        }

        let moderator_emails = text(
            &form.moderator_emails,
            prior.and_then(|c| c.moderator_emails.clone()),
        )
        .map(|list| {
            let emails = Validator::split_list(&list);
            for email in emails.iter().filter(|e| !Validator::email(e)) {
                errors.add(
                    "moderator_emails",
                    format!("contains an invalid e-mail address: {}", email),
                );
            }
            emails.join(", ")
        })
        .filter(|list| !list.is_empty());

        let mo_subscription_deadline = match form.mo_subscription_deadline.as_deref() {
            None => prior.and_then(|c| c.mo_subscription_deadline),
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => match parse_time(raw) {
                Some(at) => Some(at),
                None => {
                    errors.add("mo_subscription_deadline", "is not a valid time");
                    None
                }
            },
        };

        let real_time_update = flag(
            &mut errors,
            "real_time_update",
            &form.real_time_update,
            prior.map_or(false, |c| c.real_time_update),
        );
        let relative_schedule = flag(
            &mut errors,
            "relative_schedule",
            &form.relative_schedule,
            prior.map_or(false, |c| c.relative_schedule),
        );
        let send_only_once = flag(
            &mut errors,
            "send_only_once",
            &form.send_only_once,
            prior.map_or(false, |c| c.send_only_once),
        );
        let active = flag(&mut errors, "active", &form.active, prior.map_or(true, |c| c.active));
        let allow_mo_subscription = flag(
            &mut errors,
            "allow_mo_subscription",
            &form.allow_mo_subscription,
            prior.map_or(false, |c| c.allow_mo_subscription),
        );

        let channel_group_id = match group {
            GroupAssignment::Unchanged => prior.and_then(|c| c.channel_group_id),
            GroupAssignment::Ungrouped => None,
            GroupAssignment::Group(group) => Some(group.id),
        };

        let (Some(name), Some(kind), true) = (name, kind, errors.is_empty()) else {
            return Err(errors);
        };

        let schedule = if ChannelPolicy::new(kind, relative_schedule).has_schedule() {
            text(&form.schedule, prior.and_then(|c| c.schedule.clone()))
        } else {
            None
        };

        Ok(ChannelAttributes {
            user_id: actor_id,
            channel_group_id,
            name,
            description: text(&form.description, prior.and_then(|c| c.description.clone())),
            kind,
            keyword,
            tparty_keyword,
            one_word: text(&form.one_word, prior.and_then(|c| c.one_word.clone())),
            suffix: text(&form.suffix, prior.and_then(|c| c.suffix.clone())),
            moderator_emails,
            schedule,
            relative_schedule,
            real_time_update,
            send_only_once,
            active,
            allow_mo_subscription,
            mo_subscription_deadline,
        })
    }
}

/// Submitted text wins, trimmed and with blank meaning cleared; absent keeps `prior`.
fn text(value: &Option<String>, prior: Option<String>) -> Option<String> {
    match value {
        Some(value) => Some(value.trim().to_string()).filter(|v| !v.is_empty()),
        None => prior,
    }
}

fn flag(errors: &mut ValidationErrors, field: &str, value: &Option<String>, prior: bool) -> bool {
    match value.as_deref() {
        None => prior,
        Some(raw) if raw.trim().is_empty() => false,
        Some(raw) => Validator::boolean(raw).unwrap_or_else(|| {
            errors.add(field, "is not a valid boolean");
            prior
        }),
    }
}

/// RFC 3339, or `YYYY-MM-DD HH:MM` read as UTC.
fn parse_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"]
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
                .map(|naive| naive.and_utc())
        })
}
