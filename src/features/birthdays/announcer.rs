//! Announcement composition and delivery
//!
//! Builds the three announcement shapes and hands them to a `Notifier`.
//! Daily fires send one mention per matching member; weekly and monthly
//! fires post a single digest with birthday lines first and join
//! anniversaries after, pinged at nobody. Discord sits behind the
//! `Notifier` and `MemberDirectory` traits so composition stays
//! testable without a gateway.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.3.0
//!
//! ## Changelog
//! - 1.2.0: Member listing follows the pagination cursor past 1000
//! - 1.1.0: Age lines only when the birth year is known
//! - 1.0.0: Daily, weekly, and monthly announcement shapes

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use log::{debug, error, info};
use serenity::http::Http;
use serenity::model::guild::Member;
use serenity::model::id::{ChannelId, GuildId, UserId};

use crate::core::response::chunk_for_message;

use super::date::{month_name, BirthdayDate};
use super::error::{BirthdayError, Result};
use super::matcher;
use super::scheduler::{FireHandler, TaskKind};
use super::store::{AnnouncementSettings, BirthdayStore};

const WEEKLY_HEADER: &str = "📅 posting upcoming birthdays for the week...";
const WEEKLY_EMPTY: &str = "no upcoming birthdays or anniversaries!";
const MONTHLY_HEADER: &str = "📆 this month’s highlights:";
const MONTHLY_EMPTY: &str = "nothing on the calendar yet this month!";

/// A guild member as the announcer needs to see one.
#[derive(Debug, Clone)]
pub struct MemberRecord {
    pub subject_id: u64,
    pub display_name: String,
    pub joined: Option<DateTime<Utc>>,
    pub is_bot: bool,
}

/// Posts message content to a channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, channel_id: u64, content: &str, allow_mentions: bool) -> Result<()>;
}

/// Lists the members of the guild the bot serves.
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    async fn list_members(&self) -> Result<Vec<MemberRecord>>;
}

/// `Notifier` over the Discord REST API.
pub struct DiscordNotifier {
    http: Arc<Http>,
}

impl DiscordNotifier {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn send(&self, channel_id: u64, content: &str, allow_mentions: bool) -> Result<()> {
        ChannelId(channel_id)
            .send_message(&self.http, |message| {
                message.content(content);
                if !allow_mentions {
                    message.allowed_mentions(|mentions| mentions.empty_parse());
                }
                message
            })
            .await
            .map_err(|err| BirthdayError::Delivery(err.to_string()))?;
        Ok(())
    }
}

/// `MemberDirectory` over the Discord REST API, pinned to one guild at
/// ready time. Zero means no guild yet.
pub struct DiscordDirectory {
    http: Arc<Http>,
    guild_id: AtomicU64,
}

impl DiscordDirectory {
    pub fn new(http: Arc<Http>) -> Self {
        Self {
            http,
            guild_id: AtomicU64::new(0),
        }
    }

    pub fn pin_guild(&self, guild_id: u64) {
        self.guild_id.store(guild_id, Ordering::SeqCst);
    }

    pub fn guild(&self) -> Option<u64> {
        match self.guild_id.load(Ordering::SeqCst) {
            0 => None,
            id => Some(id),
        }
    }
}

#[async_trait]
impl MemberDirectory for DiscordDirectory {
    async fn list_members(&self) -> Result<Vec<MemberRecord>> {
        let guild_id = self
            .guild()
            .ok_or_else(|| BirthdayError::Delivery("no guild available yet".into()))?;
        let guild = GuildId(guild_id);
        collect_pages(MEMBER_PAGE, |after| {
            let http = Arc::clone(&self.http);
            async move {
                let page = guild
                    .members(&http, Some(MEMBER_PAGE as u64), after.map(UserId))
                    .await
                    .map_err(|err| BirthdayError::Delivery(err.to_string()))?;
                Ok(page.into_iter().map(record_from_member).collect())
            }
        })
        .await
    }
}

// Discord returns at most 1000 members per listing request.
const MEMBER_PAGE: usize = 1000;

fn record_from_member(member: Member) -> MemberRecord {
    MemberRecord {
        subject_id: member.user.id.0,
        display_name: member.display_name().into_owned(),
        joined: member
            .joined_at
            .and_then(|at| DateTime::from_timestamp(at.unix_timestamp(), 0)),
        is_bot: member.user.bot,
    }
}

/// Drains a cursor-paged member listing, ascending by id. Paging
/// continues while pages come back full; the cursor is the last id
/// fetched so far.
async fn collect_pages<F, Fut>(page_size: usize, mut fetch: F) -> Result<Vec<MemberRecord>>
where
    F: FnMut(Option<u64>) -> Fut,
    Fut: Future<Output = Result<Vec<MemberRecord>>>,
{
    let mut records: Vec<MemberRecord> = Vec::new();
    loop {
        let after = records.last().map(|record| record.subject_id);
        let page = fetch(after).await?;
        let full_page = page.len() == page_size;
        records.extend(page);
        if !full_page {
            return Ok(records);
        }
    }
}

/// Fires announcements into the configured channel.
pub struct BirthdayAnnouncer {
    store: Arc<BirthdayStore>,
    notifier: Arc<dyn Notifier>,
    directory: Arc<dyn MemberDirectory>,
}

impl BirthdayAnnouncer {
    pub fn new(
        store: Arc<BirthdayStore>,
        notifier: Arc<dyn Notifier>,
        directory: Arc<dyn MemberDirectory>,
    ) -> Self {
        Self {
            store,
            notifier,
            directory,
        }
    }

    /// One message per member whose birthday is `today`. A failed send
    /// is logged and the rest of the batch still goes out; the first
    /// failure is reported at the end.
    async fn announce_daily(&self, channel_id: u64, today: NaiveDate) -> Result<()> {
        let records = self.store.all_birthdays();
        let messages = daily_messages(&records, today);
        if messages.is_empty() {
            debug!("no birthdays today");
            return Ok(());
        }

        info!("🎂 announcing {} birthday(s)", messages.len());
        let mut first_failure = None;
        for message in messages {
            if let Err(err) = self.notifier.send(channel_id, &message, true).await {
                error!("failed to deliver a birthday message: {err}");
                if first_failure.is_none() {
                    first_failure = Some(err);
                }
            }
        }
        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn announce_window(
        &self,
        channel_id: u64,
        timezone: Tz,
        start: NaiveDate,
        end: NaiveDate,
        header: &str,
        empty: &str,
    ) -> Result<()> {
        let records = self.store.all_birthdays();
        let members = self.directory.list_members().await?;
        let content = window_announcement(&records, &members, timezone, start, end, header, empty);
        for chunk in chunk_for_message(&content) {
            self.notifier.send(channel_id, &chunk, false).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl FireHandler for BirthdayAnnouncer {
    async fn on_fire(&self, kind: TaskKind, settings: AnnouncementSettings) -> Result<()> {
        let channel_id = match settings.channel_id {
            Some(id) => id,
            None => {
                debug!("no announcement channel configured, skipping {kind} announcement");
                return Ok(());
            }
        };

        let today = Utc::now().with_timezone(&settings.timezone).date_naive();
        match kind {
            TaskKind::Daily => self.announce_daily(channel_id, today).await,
            TaskKind::Weekly => {
                self.announce_window(
                    channel_id,
                    settings.timezone,
                    today,
                    today + Duration::days(7),
                    WEEKLY_HEADER,
                    WEEKLY_EMPTY,
                )
                .await
            }
            TaskKind::Monthly => {
                let (start, end) = month_bounds(today)?;
                self.announce_window(
                    channel_id,
                    settings.timezone,
                    start,
                    end,
                    MONTHLY_HEADER,
                    MONTHLY_EMPTY,
                )
                .await
            }
        }
    }
}

/// One congratulation per member whose birthday lands on `today`.
fn daily_messages(records: &BTreeMap<u64, BirthdayDate>, today: NaiveDate) -> Vec<String> {
    matcher::match_today(records, today)
        .into_iter()
        .map(|(subject_id, date)| match date.age_on(today.year()) {
            Some(age) => format!("🎉 happy birthday <@{subject_id}>! 🎂 (turning {age})"),
            None => format!("🎉 happy birthday <@{subject_id}>! 🎂"),
        })
        .collect()
}

/// The digest posted by weekly and monthly fires: a header, a blank
/// line, birthday lines in occurrence order, then join-anniversary
/// lines. Members who left the guild get no birthday line; bots get no
/// join line.
fn window_announcement(
    records: &BTreeMap<u64, BirthdayDate>,
    members: &[MemberRecord],
    timezone: Tz,
    start: NaiveDate,
    end: NaiveDate,
    header: &str,
    empty: &str,
) -> String {
    let names: BTreeMap<u64, &str> = members
        .iter()
        .map(|member| (member.subject_id, member.display_name.as_str()))
        .collect();

    let mut body: Vec<String> = Vec::new();
    for hit in matcher::match_window(records, start, end) {
        let name = match names.get(&hit.subject_id) {
            Some(name) => name,
            None => continue,
        };
        let line = match hit.date.age_on(hit.occurs_on.year()) {
            Some(age) => format!(
                "🎂 {name} has a birthday on {} (turning {age})",
                hit.date.month_day_display()
            ),
            None => format!("🎂 {name} has a birthday on {}", hit.date.month_day_display()),
        };
        body.push(line);
    }

    let mut joins: Vec<(NaiveDate, u64, String)> = Vec::new();
    for member in members {
        if member.is_bot {
            continue;
        }
        let joined_local = match member.joined {
            Some(at) => at.with_timezone(&timezone).date_naive(),
            None => continue,
        };
        if let Some(occurs_on) =
            matcher::occurrence_in_window(joined_local.month(), joined_local.day(), start, end)
        {
            let years = occurs_on.year() - joined_local.year();
            joins.push((
                occurs_on,
                member.subject_id,
                format!(
                    "👋 {} joined {years} years ago on {} {}",
                    member.display_name,
                    month_name(joined_local.month()),
                    joined_local.day()
                ),
            ));
        }
    }
    joins.sort_by_key(|(occurs_on, subject_id, _)| (*occurs_on, *subject_id));
    body.extend(joins.into_iter().map(|(_, _, line)| line));

    if body.is_empty() {
        body.push(empty.to_string());
    }

    let mut lines = vec![format!("{header}\n")];
    lines.extend(body);
    lines.join("\n")
}

/// First and last day of the month `today` falls in.
fn month_bounds(today: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1);
    let next_month = if today.month() == 12 {
        NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)
    };
    match (start, next_month) {
        (Some(start), Some(next_month)) => Ok((start, next_month - Duration::days(1))),
        _ => Err(BirthdayError::Scheduling(format!(
            "no month bounds around {today}"
        ))),
    }
}
