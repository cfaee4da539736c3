//! Screen labels in the supported languages.

use crate::preferences::Language;

/// A translatable piece of screen text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Label {
    // Navigation
    PatientsTab,
    SettingsTab,
    BackToPatients,
    Loading,

    // Onboarding
    Welcome,
    OnboardingHeadless,
    OnboardingOpenSource,
    OnboardingServices,
    OnboardingApps,
    GetStarted,

    // Login
    Email,
    Password,
    SignIn,
    LoggedInAs,

    // Patient list
    Search,
    Previous,
    Next,
    Page,
    NoPatients,

    // Patient detail
    PatientDetails,
    FamilyName,
    GivenName,
    NationalId,
    Gender,
    BirthDate,
    Phone,
    Status,
    Active,
    Inactive,
    DiagnosticReports,
    NoReports,
    UnnamedReport,
    EffectiveDate,
    Conclusion,
    Value,
    ReferenceRanges,
    ReferenceRange,
    UnknownRangeType,
    Category,
    Performer,
    Interpretation,

    // Settings
    SettingsTitle,
    General,
    About,
    AppName,
    Version,
    LanguageTitle,
    English,
    Arabic,
    ThemeTitle,
    ThemeDark,
    ThemeLight,
    ThemeSystem,
    Logout,

    // Subscriptions
    Notifications,
    Reconnecting,
}

/// Text for `label` in `language`.
pub fn text(language: Language, label: Label) -> &'static str {
    match language {
        Language::English => english(label),
        Language::Arabic => arabic(label),
    }
}

fn english(label: Label) -> &'static str {
    use Label::*;
    match label {
        PatientsTab => "Patients",
        SettingsTab => "Settings",
        BackToPatients => "← Back to Patients",
        Loading => "Loading…",
        Welcome => "Welcome to Medplum",
        OnboardingHeadless => "🏥 Medplum is a headless EHR.",
        OnboardingOpenSource => "👨‍⚕️ Open source healthcare platform",
        OnboardingServices => "🩺 Develop any healthcare services.",
        OnboardingApps => "💊 Build many types of applications.",
        GetStarted => "Let's Get Started",
        Email => "Email",
        Password => "Password",
        SignIn => "Sign in",
        LoggedInAs => "Logged in as",
        Search => "Search",
        Previous => "Previous",
        Next => "Next",
        Page => "Page",
        NoPatients => "No patients found",
        PatientDetails => "Patient Details",
        FamilyName => "Family Name",
        GivenName => "Given Name",
        NationalId => "SSN",
        Gender => "Gender",
        BirthDate => "Birth Date",
        Phone => "Phone",
        Status => "Status",
        Active => "Active",
        Inactive => "Inactive",
        DiagnosticReports => "Diagnostic Reports",
        NoReports => "No diagnostic reports found",
        UnnamedReport => "Unnamed Report",
        EffectiveDate => "Effective Date",
        Conclusion => "Conclusion",
        Value => "Value",
        ReferenceRanges => "Reference Ranges",
        ReferenceRange => "Reference Range",
        UnknownRangeType => "Unknown type",
        Category => "Category",
        Performer => "Performer",
        Interpretation => "Interpretation",
        SettingsTitle => "Settings",
        General => "General",
        About => "About",
        AppName => "App Name",
        Version => "Version",
        LanguageTitle => "Language",
        English => "English",
        Arabic => "عربي",
        ThemeTitle => "Theme",
        ThemeDark => "Dark",
        ThemeLight => "Light",
        ThemeSystem => "System",
        Logout => "Logout",
        Notifications => "Notifications:",
        Reconnecting => "Reconnecting:",
    }
}

fn arabic(label: Label) -> &'static str {
    use Label::*;
    match label {
        PatientsTab => "المرضى",
        SettingsTab => "الإعدادات",
        BackToPatients => "→ العودة إلى المرضى",
        Loading => "جارٍ التحميل…",
        Welcome => "مرحبًا بك في Medplum",
        OnboardingHeadless => "🏥 Medplum سجل صحي إلكتروني بدون واجهة.",
        OnboardingOpenSource => "👨‍⚕️ منصة رعاية صحية مفتوحة المصدر",
        OnboardingServices => "🩺 طوّر أي خدمات رعاية صحية.",
        OnboardingApps => "💊 ابنِ أنواعًا كثيرة من التطبيقات.",
        GetStarted => "لنبدأ",
        Email => "البريد الإلكتروني",
        Password => "كلمة المرور",
        SignIn => "تسجيل الدخول",
        LoggedInAs => "تم تسجيل الدخول باسم",
        Search => "بحث",
        Previous => "السابق",
        Next => "التالي",
        Page => "صفحة",
        NoPatients => "لم يتم العثور على مرضى",
        PatientDetails => "تفاصيل المريض",
        FamilyName => "اسم العائلة",
        GivenName => "الاسم الأول",
        NationalId => "رقم الضمان الاجتماعي",
        Gender => "الجنس",
        BirthDate => "تاريخ الميلاد",
        Phone => "الهاتف",
        Status => "الحالة",
        Active => "نشط",
        Inactive => "غير نشط",
        DiagnosticReports => "التقارير التشخيصية",
        NoReports => "لم يتم العثور على تقارير تشخيصية",
        UnnamedReport => "تقرير بدون اسم",
        EffectiveDate => "تاريخ السريان",
        Conclusion => "الخلاصة",
        Value => "القيمة",
        ReferenceRanges => "النطاقات المرجعية",
        ReferenceRange => "النطاق المرجعي",
        UnknownRangeType => "نوع غير معروف",
        Category => "الفئة",
        Performer => "المنفذ",
        Interpretation => "التفسير",
        SettingsTitle => "الإعدادات",
        General => "عام",
        About => "حول",
        AppName => "اسم التطبيق",
        Version => "الإصدار",
        LanguageTitle => "اللغة",
        English => "English",
        Arabic => "عربي",
        ThemeTitle => "السمة",
        ThemeDark => "داكن",
        ThemeLight => "فاتح",
        ThemeSystem => "النظام",
        Logout => "تسجيل الخروج",
        Notifications => "الإشعارات:",
        Reconnecting => "إعادة الاتصال:",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_names_are_shown_in_their_own_script() {
        for language in Language::ALL {
            assert_eq!(text(language, Label::English), "English");
            assert_eq!(text(language, Label::Arabic), "عربي");
        }
    }

    #[test]
    fn test_labels_differ_between_languages() {
        assert_eq!(text(Language::English, Label::UnnamedReport), "Unnamed Report");
        assert_ne!(
            text(Language::Arabic, Label::PatientDetails),
            text(Language::English, Label::PatientDetails)
        );
    }
}
