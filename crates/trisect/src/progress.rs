//! 📊 progress.rs — "Are we there yet?" — every bucket listing, every time, forever.
//!
//! 🚀 This module answers the age-old question: "how fast are the keys flowing?"
//! With cold hard numbers, a progress bar, and a table so comfy it has lumbar support.
//!
//! ⚠️  Warning: Watching this progress bar will not make the bucket smaller.
//! Neither will refreshing it. We've tried. Science says no.
//!
//! 🧠 Knowledge graph:
//! - Pass 1 runs with `total = 0` (unknown) — no percent, no ETA, just a counter.
//!   The bucket does not greet us at the door with a number. It's mysterious like that.
//! - Pass 2 runs with the EXACT total from pass 1. No hard-coded estimates anywhere.
//!   Magic numbers age like milk; measured numbers age like a ledger.
//! - `ProgressMetrics::hidden(...)` exists so tests (and `runtime.progress = false`)
//!   can run the whole pipeline in respectful silence. Cosmetic means cosmetic:
//!   delete this module and every count in the manifest stays identical.
//!
//! 🦆 The duck has nothing to do with this module. It's just vibing.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::NOTHING};
use indicatif::{ProgressBar, ProgressStyle};

/// 🔢 Formats a number with commas for the 3 people in the audience who like readability.
/// "1000000 objects" → "1,000,000 objects" — you're welcome, eyes.
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// ⏱️ Formats a Duration into MM:SS or HH:MM:SS.
/// If it shows HH:MM:SS, your bucket has a lot of art in it. Congratulations?
fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// 📊 The brains behind the progress display. Tracks objects, rates, and your sanity.
///
/// Uses a sliding 5-second window for rate calculations so spikes don't scare you.
/// (Your heart rate is not our responsibility.)
///
/// # Ancient Proverb
/// "He who hard-codes the expected object count, renders a progress bar
/// that lies with a straight face for the rest of the tool's life."
pub(crate) struct ProgressMetrics {
    /// 🏷️ what are we even listing? a name to display in the UI
    label: String,
    /// 📏 total objects expected — 0 if we have no idea (pass 1 mode)
    total_size: u64,
    /// 🔑 objects seen so far — each one a tiny victory
    total_objects: u64,
    /// 🎨 the actual terminal progress bar (indicatif does the heavy lifting here)
    progress_bar: ProgressBar,
    /// 🔄 sliding window of (timestamp, objects) for rate calculation
    rate_samples: VecDeque<(Instant, u64)>,
    /// ⏱️ when did this whole adventure start? hopefully not too long ago.
    start_time: Instant,
}

impl std::fmt::Debug for ProgressMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // -- 🎭 custom Debug impl because ProgressBar is a diva and doesn't derive Debug
        f.debug_struct("ProgressMetrics")
            .field("label", &self.label)
            .field("total_size", &self.total_size)
            .field("total_objects", &self.total_objects)
            .finish()
    }
}

impl ProgressMetrics {
    /// 🚀 Spin up a new ProgressMetrics.
    ///
    /// `total_size` is the total object count we expect. Pass 0 for "I have no idea"
    /// — that's not a cop-out, that's pass 1, where counting is literally the job.
    pub(crate) fn new(label: String, total_size: u64) -> Self {
        // -- 🎨 cyan because it's classy, blue because it's calm
        let progress_bar = ProgressBar::new(total_size);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg}\n| [{bar:40.cyan/blue}]")
                .unwrap() // -- 🐛 safe unwrap: template string is hardcoded and valid, I checked, twice
                .progress_chars("=>-"),
        );
        Self::with_bar(label, total_size, progress_bar)
    }

    /// 🤫 A ProgressMetrics that renders nothing, ever. Same counters, zero terminal.
    ///
    /// Used when `runtime.progress = false` and by every test that would rather
    /// not have a progress bar screaming into the captured stdout.
    pub(crate) fn hidden(label: String, total_size: u64) -> Self {
        Self::with_bar(label, total_size, ProgressBar::hidden())
    }

    fn with_bar(label: String, total_size: u64, progress_bar: ProgressBar) -> Self {
        let start_time = Instant::now();

        // -- 🔄 seed the rate window with t=0 so we don't divide by zero like animals
        let mut rate_samples = VecDeque::new();
        rate_samples.push_back((start_time, 0u64));

        Self {
            label,
            total_size,
            total_objects: 0,
            progress_bar,
            rate_samples,
            start_time,
        }
    }

    /// 🔄 Feed the metrics engine with a fresh page of objects.
    ///
    /// Call this after every listing page. It accumulates totals, recalculates the
    /// rate, re-renders the table, and updates the bar position. Like a treadmill,
    /// but useful.
    pub(crate) fn update(&mut self, objects_seen: u64) {
        self.total_objects += objects_seen;

        let rate = self.calculate_rate();
        self.render(rate);
        self.progress_bar.set_position(self.total_objects);
    }

    /// ✅ Mark the progress bar done. Ring the bell. We made it.
    /// (Or the listing ran dry. Same energy.)
    pub(crate) fn finish(&self) {
        self.progress_bar.finish();
    }

    /// 📈 Current objects/sec over a 5-second sliding window.
    ///
    /// Sliding window keeps the displayed rate from looking like a seismograph
    /// during normal operation. Short bursts won't spike you into existential terror.
    fn calculate_rate(&mut self) -> f64 {
        let now = Instant::now();
        // 🔄 evict samples older than 5 seconds from the front of the queue
        // -- like a bouncer at a club, but for data points
        let window = Duration::from_secs(5);
        while let Some(&(timestamp, _)) = self.rate_samples.front() {
            if now.duration_since(timestamp) > window {
                self.rate_samples.pop_front();
            } else {
                break;
            }
        }

        self.rate_samples.push_back((now, self.total_objects));

        if let Some(&(oldest_time, oldest_objects)) = self.rate_samples.front() {
            let elapsed = now.duration_since(oldest_time).as_secs_f64();
            if elapsed > 0.0 {
                let delta = self.total_objects.saturating_sub(oldest_objects);
                return delta as f64 / elapsed;
            }
        }

        // -- 💤 not enough elapsed time yet — return zero and maintain composure
        0.0
    }

    /// 🎨 Render the full progress display as a comfy-table message on the progress bar.
    ///
    /// Layout (3 rows x 2 cols):
    /// ```text
    /// | listing: <label>
    /// | [=====>----------]
    ///   <objects/s>   <total objects>
    ///   <%>           <current/total>
    ///   <elapsed>     <remaining>
    /// ```
    ///
    /// If you're reading this comment at 3am during an incident, I'm so sorry.
    /// At least the table looks nice.
    fn render(&self, rate: f64) {
        // -- 📊 overall percent — 0 if total unknown (pass 1 flies blind, on purpose)
        let percent = if self.total_size > 0 {
            (self.total_objects as f64 / self.total_size as f64) * 100.0
        } else {
            0.0
        };

        let objects_rate = format_number(rate as u64);
        let objects_total = format_number(self.total_objects);

        // ⏱️ time stats
        let elapsed = self.start_time.elapsed();
        let elapsed_fmt = format_duration(elapsed);
        let remaining = if percent > 0.0 {
            // 🔮 linear extrapolation — assumes the future looks like the past
            // -- (historically a bad assumption, but fine for bucket listings)
            let total_estimated = elapsed.as_secs_f64() / (percent / 100.0);
            let remaining_secs = total_estimated - elapsed.as_secs_f64();
            if remaining_secs > 0.0 {
                format_duration(Duration::from_secs_f64(remaining_secs))
            } else {
                "--:--".to_string()
            }
        } else {
            // -- ⚠️  no percent progress means no ETA — we're flying blind, captain
            "--:--".to_string()
        };

        // -- "current/total" fraction, or just "current" when the total is a mystery
        let count_fraction = if self.total_size > 0 {
            format!("{} / {}", objects_total, format_number(self.total_size))
        } else {
            format!("{} / ?", objects_total)
        };

        // 🍽️ build the comfy table — two columns, right-aligned, no borders (preset: NOTHING)
        // -- NOTHING preset because we're minimalists. and also the borders looked bad.
        let mut table = Table::new();
        table.load_preset(NOTHING);
        table.set_content_arrangement(ContentArrangement::Dynamic);

        // 🚀 row 1: throughput and cumulative count
        table.add_row(vec![
            Cell::new(format!("{} Objects/s", objects_rate)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{} Objects", objects_total)).set_alignment(CellAlignment::Right),
        ]);
        // 📊 row 2: completion
        table.add_row(vec![
            Cell::new(format!("{:.2}%", percent)).set_alignment(CellAlignment::Right),
            Cell::new(count_fraction).set_alignment(CellAlignment::Right),
        ]);
        // ⏱️ row 3: time elapsed and estimated time remaining
        table.add_row(vec![
            Cell::new(format!("{} elapsed", elapsed_fmt)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{} remaining", remaining)).set_alignment(CellAlignment::Right),
        ]);

        // -- 🎨 slam it all into the progress bar message
        // indicatif will handle the terminal magic (cursor positioning, redraw, etc.)
        self.progress_bar
            .set_message(format!("listing: {}\n{}", self.label, table));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_one_where_commas_find_their_places() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(61578), "61,578");
        assert_eq!(format_number(1_000_000), "1,000,000");
    }

    #[test]
    fn the_one_where_durations_dress_for_the_occasion() {
        assert_eq!(format_duration(Duration::from_secs(59)), "00:59");
        assert_eq!(format_duration(Duration::from_secs(61)), "01:01");
        assert_eq!(format_duration(Duration::from_secs(3661)), "01:01:01");
    }

    #[test]
    fn the_one_where_a_hidden_bar_still_counts_honestly() {
        // 🧪 Cosmetic means cosmetic: hidden bars keep exact counts anyway.
        let mut progress = ProgressMetrics::hidden("test".into(), 0);
        progress.update(40);
        progress.update(2);
        assert!(format!("{progress:?}").contains("total_objects: 42"));
        progress.finish();
    }
}
