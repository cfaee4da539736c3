//! Terminal rendering of the screens.
//!
//! Every screen renders to a `String` of lines. Labels come from [`crate::i18n`] in
//! the selected language; colour follows the selected theme and can be switched off
//! entirely for piped output and tests.

use crate::constants::{APP_NAME, NOT_AVAILABLE};
use crate::dates::format_optional_date;
use crate::detail::{PatientDetail, ReportWithObservations};
use crate::i18n::{self, Label};
use crate::list::PatientList;
use crate::preferences::{Language, Theme};
use crate::range::RangeIndicator;
use crate::watch::NotificationWatcher;
use fhir::{
    CodeableConcept, ObservationData, PatientData, Quantity, ReferenceRange, ReportStatus,
};

const RESET: &str = "\x1b[0m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const RIGHT_TO_LEFT_MARK: char = '\u{200F}';

/// Renders screens in one language and theme.
#[derive(Clone, Copy, Debug)]
pub struct Renderer {
    language: Language,
    theme: Theme,
    colour: bool,
}

impl Renderer {
    pub fn new(language: Language, theme: Theme, colour: bool) -> Self {
        Self {
            language,
            theme,
            colour,
        }
    }

    /// No escape sequences at all.
    pub fn plain(language: Language) -> Self {
        Self::new(language, Theme::System, false)
    }

    pub fn text(&self, label: Label) -> &'static str {
        i18n::text(self.language, label)
    }

    // ========================================================================
    // STYLING
    // ========================================================================

    fn paint(&self, code: &str, text: &str) -> String {
        if self.colour {
            format!("{code}{text}{RESET}")
        } else {
            text.to_owned()
        }
    }

    fn heading(&self, text: &str) -> String {
        let code = match self.theme {
            Theme::Dark => "\x1b[1;97m",
            Theme::Light => "\x1b[1;30m",
            Theme::System => "\x1b[1m",
        };
        self.paint(code, text)
    }

    fn field(&self, label: Label, value: &str) -> String {
        format!("{}: {value}", self.text(label))
    }

    fn finish(&self, lines: Vec<String>) -> String {
        if self.language.is_rtl() {
            lines
                .into_iter()
                .map(|line| format!("{RIGHT_TO_LEFT_MARK}{line}"))
                .collect::<Vec<_>>()
                .join("\n")
        } else {
            lines.join("\n")
        }
    }

    // ========================================================================
    // SCREENS
    // ========================================================================

    pub fn onboarding(&self) -> String {
        self.finish(vec![
            self.heading(self.text(Label::Welcome)),
            String::new(),
            self.text(Label::OnboardingHeadless).to_owned(),
            self.text(Label::OnboardingOpenSource).to_owned(),
            self.text(Label::OnboardingServices).to_owned(),
            self.text(Label::OnboardingApps).to_owned(),
            String::new(),
            format!("[{}]", self.text(Label::GetStarted)),
        ])
    }

    /// Patient list: filter, rows, then the pager.
    pub fn patient_list(&self, list: &PatientList) -> String {
        let mut lines = vec![self.heading(self.text(Label::PatientsTab))];
        lines.push(self.field(Label::Search, list.filter().unwrap_or("")));
        lines.push(String::new());

        if list.is_loading() && list.rows().is_empty() {
            lines.push(self.text(Label::Loading).to_owned());
        } else if list.rows().is_empty() {
            lines.push(self.text(Label::NoPatients).to_owned());
        } else {
            for row in list.rows() {
                lines.push(row.name.clone());
                lines.push(format!("  {}", self.paint(DIM, &row.id_label())));
            }
        }

        lines.push(String::new());
        lines.push(format!(
            "{}  {} {}  {}",
            self.button(Label::Previous, list.prev_disabled()),
            self.text(Label::Page),
            list.page(),
            self.button(Label::Next, list.next_disabled()),
        ));
        self.finish(lines)
    }

    fn button(&self, label: Label, disabled: bool) -> String {
        let text = format!("[{}]", self.text(label));
        if disabled {
            self.paint(DIM, &text)
        } else {
            text
        }
    }

    /// Patient detail: demographics followed by each report with its observations.
    pub fn patient_detail(&self, detail: &PatientDetail) -> String {
        let mut lines = vec![self.text(Label::BackToPatients).to_owned(), String::new()];

        if let Some(error) = detail.error() {
            lines.push(self.paint(RED, error));
            lines.push(String::new());
        }

        let Some(patient) = detail.patient() else {
            if detail.is_loading() {
                lines.push(self.text(Label::Loading).to_owned());
            }
            return self.finish(lines);
        };

        lines.push(self.heading(self.text(Label::PatientDetails)));
        self.demographics(patient, &mut lines);
        lines.push(String::new());

        lines.push(self.heading(self.text(Label::DiagnosticReports)));
        if detail.reports().is_empty() {
            lines.push(self.text(Label::NoReports).to_owned());
        }
        for entry in detail.reports() {
            lines.push(String::new());
            self.report(entry, &mut lines);
        }
        self.finish(lines)
    }

    fn demographics(&self, patient: &PatientData, lines: &mut Vec<String>) {
        let given = patient.given().join(" ");
        let gender = patient
            .gender
            .map(|g| g.as_code().to_uppercase())
            .unwrap_or_else(|| NOT_AVAILABLE.to_owned());
        let status = if patient.is_active() {
            Label::Active
        } else {
            Label::Inactive
        };

        lines.push(self.field(Label::FamilyName, patient.family().unwrap_or(NOT_AVAILABLE)));
        lines.push(self.field(Label::GivenName, or_na(&given)));
        lines.push(self.field(Label::NationalId, patient.national_id().unwrap_or(NOT_AVAILABLE)));
        lines.push(self.field(Label::Gender, &gender));
        lines.push(self.field(
            Label::BirthDate,
            &format_optional_date(patient.birth_date.as_ref()),
        ));
        lines.push(self.field(Label::Phone, patient.phone().unwrap_or(NOT_AVAILABLE)));
        lines.push(self.field(Label::Status, self.text(status)));
    }

    fn report(&self, entry: &ReportWithObservations, lines: &mut Vec<String>) {
        let report = &entry.report;
        let name = report
            .name()
            .filter(|n| !n.is_empty())
            .unwrap_or(self.text(Label::UnnamedReport));
        lines.push(self.heading(name));

        let status = match report.status {
            ReportStatus::Final => self.paint(GREEN, &format!("● {}", report.status.as_code())),
            other => other.as_code().to_owned(),
        };
        lines.push(self.field(Label::Status, &status));
        lines.push(self.field(
            Label::EffectiveDate,
            &format_optional_date(report.effective.as_ref()),
        ));
        if let Some(conclusion) = report.conclusion.as_deref().filter(|c| !c.is_empty()) {
            lines.push(self.field(Label::Conclusion, conclusion));
        }

        for observation in &entry.observations {
            self.observation(observation, lines);
        }
    }

    fn observation(&self, observation: &ObservationData, lines: &mut Vec<String>) {
        let name = observation
            .code
            .as_ref()
            .and_then(CodeableConcept::label)
            .unwrap_or(NOT_AVAILABLE);
        lines.push(format!("  - {name}"));

        let value = value_text(observation.value_quantity.as_ref());
        let value = match RangeIndicator::for_observation(observation) {
            RangeIndicator::InRange => self.paint(GREEN, &value),
            RangeIndicator::OutOfRange => self.paint(RED, &value),
            RangeIndicator::Neutral => value,
        };
        lines.push(format!("    {}", self.field(Label::Value, &value)));

        if !observation.reference_ranges.is_empty() {
            lines.push(format!("    {}:", self.text(Label::ReferenceRanges)));
            for range in &observation.reference_ranges {
                lines.push(format!("      {}", self.reference_range(range)));
            }
        }

        let categories: Vec<String> = observation
            .categories
            .iter()
            .filter_map(CodeableConcept::displays_or_text)
            .collect();
        lines.push(format!(
            "    {}",
            self.field(Label::Category, or_na(&categories.join(", ")))
        ));

        let performers: Vec<&str> = observation
            .performers
            .iter()
            .filter_map(|p| p.display.as_deref())
            .collect();
        lines.push(format!(
            "    {}",
            self.field(Label::Performer, or_na(&performers.join(", ")))
        ));

        let interpretation = observation
            .interpretation
            .as_ref()
            .and_then(|i| i.summary())
            .unwrap_or_else(|| NOT_AVAILABLE.to_owned());
        lines.push(format!(
            "    {}",
            self.field(Label::Interpretation, &interpretation)
        ));
        lines.push(format!(
            "    {}",
            self.field(Label::Status, observation.status.as_code())
        ));
    }

    /// `Reference Range (<type>): <low> <unit> - <high> <unit>`
    pub fn reference_range(&self, range: &ReferenceRange) -> String {
        let kind = range
            .type_text
            .as_deref()
            .unwrap_or(self.text(Label::UnknownRangeType));
        format!(
            "{} ({kind}): {} - {}",
            self.text(Label::ReferenceRange),
            bound_text(range.low.as_ref()),
            bound_text(range.high.as_ref()),
        )
    }

    /// Settings: general preferences with the current choice marked, then about.
    pub fn settings(&self) -> String {
        let mark = |selected: bool| if selected { "✓" } else { " " };
        let mut lines = vec![self.heading(self.text(Label::SettingsTitle)), String::new()];

        lines.push(self.heading(self.text(Label::General)));
        lines.push(format!("{}:", self.text(Label::LanguageTitle)));
        for language in Language::ALL {
            let label = match language {
                Language::English => Label::English,
                Language::Arabic => Label::Arabic,
            };
            lines.push(format!(
                "  {} {} ({})",
                mark(language == self.language),
                self.text(label),
                language.code()
            ));
        }
        lines.push(format!("{}:", self.text(Label::ThemeTitle)));
        for theme in Theme::ALL {
            let label = match theme {
                Theme::Dark => Label::ThemeDark,
                Theme::Light => Label::ThemeLight,
                Theme::System => Label::ThemeSystem,
            };
            lines.push(format!(
                "  {} {} ({})",
                mark(theme == self.theme),
                self.text(label),
                theme.as_str()
            ));
        }

        lines.push(String::new());
        lines.push(self.heading(self.text(Label::About)));
        lines.push(self.field(Label::AppName, APP_NAME));
        lines.push(self.field(Label::Version, env!("CARGO_PKG_VERSION")));
        lines.push(String::new());
        lines.push(format!("[{}]", self.text(Label::Logout)));
        self.finish(lines)
    }

    /// Notification widget: count and reconnecting flag.
    pub fn notifications(&self, watcher: &NotificationWatcher) -> String {
        self.finish(vec![
            format!("{} {}", self.text(Label::Notifications), watcher.count()),
            format!(
                "{} {}",
                self.text(Label::Reconnecting),
                watcher.is_reconnecting()
            ),
        ])
    }
}

fn or_na(text: &str) -> &str {
    if text.is_empty() {
        NOT_AVAILABLE
    } else {
        text
    }
}

/// Value with two decimals and its unit.
pub fn value_text(quantity: Option<&Quantity>) -> String {
    let Some(value) = quantity.and_then(|q| q.value) else {
        return NOT_AVAILABLE.to_owned();
    };
    match quantity.and_then(|q| q.unit.as_deref()) {
        Some(unit) if !unit.is_empty() => format!("{value:.2} {unit}"),
        _ => format!("{value:.2}"),
    }
}

fn bound_text(quantity: Option<&Quantity>) -> String {
    let value = quantity
        .and_then(|q| q.value)
        .map_or_else(|| NOT_AVAILABLE.to_owned(), |v| v.to_string());
    match quantity.and_then(|q| q.unit.as_deref()) {
        Some(unit) if !unit.is_empty() => format!("{value} {unit}"),
        _ => value,
    }
}
