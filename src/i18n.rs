//! Message catalogue and `Accept-Language` negotiation.
//!
//! Every string a client can read (success messages, error details and
//! notification texts) is a [`Msg`] rendered for a [`Locale`].

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl Locale {
    pub fn as_str(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Es => "es",
        }
    }

    fn from_primary_subtag(tag: &str) -> Option<Self> {
        let primary = tag.split(['-', '_']).next().unwrap_or("").trim();
        if primary.eq_ignore_ascii_case("en") {
            Some(Locale::En)
        } else if primary.eq_ignore_ascii_case("es") {
            Some(Locale::Es)
        } else {
            None
        }
    }

    /// Picks the best supported locale from an `Accept-Language` value.
    pub fn negotiate(header: Option<&str>) -> Self {
        let Some(header) = header else {
            return Locale::default();
        };

        let mut ranked: Vec<(&str, f32)> = header
            .split(',')
            .filter_map(|part| {
                let mut pieces = part.split(';');
                let tag = pieces.next()?.trim();
                if tag.is_empty() {
                    return None;
                }
                let q = pieces
                    .filter_map(|p| p.trim().strip_prefix("q="))
                    .find_map(|v| v.trim().parse::<f32>().ok())
                    .unwrap_or(1.0);
                Some((tag, q))
            })
            .filter(|(_, q)| *q > 0.0)
            .collect();
        // stable: equal weights keep header order
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        ranked
            .into_iter()
            .find_map(|(tag, _)| Locale::from_primary_subtag(tag))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    // outcomes
    SignedUp { email: String, activity: String },
    Waitlisted { email: String, activity: String, position: i64 },
    Unregistered { email: String, activity: String },

    // notification texts
    NoticeEnrolled { activity: String },
    NoticeWaitlisted { activity: String, position: Option<i64> },
    NoticePromoted { activity: String },
    NoticeUnregistered { activity: String },
    NoticeActivityCancelled { activity: String },

    // failures
    ActivityNotFound,
    ActivityFull,
    AlreadyEnrolled,
    AlreadyWaitlisted,
    NotRegistered,
    EmailTaken,
    InvalidCredentials,
    Unauthorized,
    Forbidden,
    InvalidEmail,
    PasswordTooShort { min: usize },
    EmptyField { field: &'static str },
    InvalidCapacity,
    CapacityBelowEnrollment { enrolled: i64 },
    ActivityExists,
    InvalidSchedule { reason: String },
    InvalidRole { role: String },
    InvalidExportFormat { format: String },
    MalformedBody { reason: String },
    NotificationNotFound,
    UserNotFound,
    Internal,
}

impl Msg {
    pub fn render(&self, locale: Locale) -> String {
        match locale {
            Locale::En => self.render_en(),
            Locale::Es => self.render_es(),
        }
    }

    fn render_en(&self) -> String {
        match self {
            Msg::SignedUp { email, activity } => {
                format!("Successfully signed up {} for {}", email, activity)
            }
            Msg::Waitlisted {
                email,
                activity,
                position,
            } => format!(
                "{} was added to the waitlist for {} (position {})",
                email, activity, position
            ),
            Msg::Unregistered { email, activity } => {
                format!("Successfully unregistered {} from {}", email, activity)
            }
            Msg::NoticeEnrolled { activity } => format!("You are enrolled in {}.", activity),
            Msg::NoticeWaitlisted { activity, position } => match position {
                Some(p) => format!("You are on the waitlist for {} at position {}.", activity, p),
                None => format!("You are on the waitlist for {}.", activity),
            },
            Msg::NoticePromoted { activity } => format!(
                "A spot opened up: you moved from the waitlist into {}.",
                activity
            ),
            Msg::NoticeUnregistered { activity } => {
                format!("You are no longer registered for {}.", activity)
            }
            Msg::NoticeActivityCancelled { activity } => {
                format!("{} has been cancelled.", activity)
            }
            Msg::ActivityNotFound => "Activity not found".to_string(),
            Msg::ActivityFull => "Activity is full".to_string(),
            Msg::AlreadyEnrolled => "Already signed up for this activity".to_string(),
            Msg::AlreadyWaitlisted => "Already on the waitlist for this activity".to_string(),
            Msg::NotRegistered => "Not signed up for this activity".to_string(),
            Msg::EmailTaken => "Email already registered".to_string(),
            Msg::InvalidCredentials => "Invalid email or password".to_string(),
            Msg::Unauthorized => "Not authenticated".to_string(),
            Msg::Forbidden => "Not allowed to perform this action".to_string(),
            Msg::InvalidEmail => "Invalid email address".to_string(),
            Msg::PasswordTooShort { min } => {
                format!("Password must be at least {} characters", min)
            }
            Msg::EmptyField { field } => format!("{} must not be empty", field),
            Msg::InvalidCapacity => "max_participants must be at least 1".to_string(),
            Msg::CapacityBelowEnrollment { enrolled } => format!(
                "max_participants cannot be lower than the current enrollment ({})",
                enrolled
            ),
            Msg::ActivityExists => "Activity already exists".to_string(),
            Msg::InvalidSchedule { reason } => format!("Invalid schedule: {}", reason),
            Msg::InvalidRole { role } => format!("Unknown role: {}", role),
            Msg::InvalidExportFormat { format } => format!("Unsupported export format: {}", format),
            Msg::MalformedBody { reason } => format!("Malformed request body: {}", reason),
            Msg::NotificationNotFound => "Notification not found".to_string(),
            Msg::UserNotFound => "User not found".to_string(),
            Msg::Internal => "Internal server error".to_string(),
        }
    }

    fn render_es(&self) -> String {
        match self {
            Msg::SignedUp { email, activity } => {
                format!("{} se inscribió correctamente en {}", email, activity)
            }
            Msg::Waitlisted {
                email,
                activity,
                position,
            } => format!(
                "{} fue añadido a la lista de espera de {} (posición {})",
                email, activity, position
            ),
            Msg::Unregistered { email, activity } => {
                format!("{} fue dado de baja de {}", email, activity)
            }
            Msg::NoticeEnrolled { activity } => format!("Estás inscrito en {}.", activity),
            Msg::NoticeWaitlisted { activity, position } => match position {
                Some(p) => format!("Estás en la lista de espera de {} en la posición {}.", activity, p),
                None => format!("Estás en la lista de espera de {}.", activity),
            },
            Msg::NoticePromoted { activity } => format!(
                "Se liberó una plaza: pasaste de la lista de espera a {}.",
                activity
            ),
            Msg::NoticeUnregistered { activity } => {
                format!("Ya no estás inscrito en {}.", activity)
            }
            Msg::NoticeActivityCancelled { activity } => {
                format!("{} ha sido cancelada.", activity)
            }
            Msg::ActivityNotFound => "Actividad no encontrada".to_string(),
            Msg::ActivityFull => "La actividad está completa".to_string(),
            Msg::AlreadyEnrolled => "Ya estás inscrito en esta actividad".to_string(),
            Msg::AlreadyWaitlisted => "Ya estás en la lista de espera de esta actividad".to_string(),
            Msg::NotRegistered => "No estás inscrito en esta actividad".to_string(),
            Msg::EmailTaken => "El correo ya está registrado".to_string(),
            Msg::InvalidCredentials => "Correo o contraseña incorrectos".to_string(),
            Msg::Unauthorized => "No autenticado".to_string(),
            Msg::Forbidden => "No tienes permiso para realizar esta acción".to_string(),
            Msg::InvalidEmail => "Correo electrónico no válido".to_string(),
            Msg::PasswordTooShort { min } => {
                format!("La contraseña debe tener al menos {} caracteres", min)
            }
            Msg::EmptyField { field } => format!("{} no puede estar vacío", field),
            Msg::InvalidCapacity => "max_participants debe ser al menos 1".to_string(),
            Msg::CapacityBelowEnrollment { enrolled } => format!(
                "max_participants no puede ser menor que la inscripción actual ({})",
                enrolled
            ),
            Msg::ActivityExists => "La actividad ya existe".to_string(),
            Msg::InvalidSchedule { reason } => format!("Horario no válido: {}", reason),
            Msg::InvalidRole { role } => format!("Rol desconocido: {}", role),
            Msg::InvalidExportFormat { format } => {
                format!("Formato de exportación no soportado: {}", format)
            }
            Msg::MalformedBody { reason } => {
                format!("Cuerpo de la solicitud mal formado: {}", reason)
            }
            Msg::NotificationNotFound => "Notificación no encontrada".to_string(),
            Msg::UserNotFound => "Usuario no encontrado".to_string(),
            Msg::Internal => "Error interno del servidor".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_header_defaults_to_english() {
        assert_eq!(Locale::negotiate(None), Locale::En);
        assert_eq!(Locale::negotiate(Some("")), Locale::En);
    }

    #[test]
    fn region_subtags_match_primary_language() {
        assert_eq!(Locale::negotiate(Some("es-MX")), Locale::Es);
        assert_eq!(Locale::negotiate(Some("en_GB")), Locale::En);
    }

    #[test]
    fn weights_decide_between_supported_languages() {
        assert_eq!(Locale::negotiate(Some("en;q=0.5, es;q=0.9")), Locale::Es);
        assert_eq!(Locale::negotiate(Some("es;q=0.2, en")), Locale::En);
    }

    #[test]
    fn unsupported_languages_are_skipped() {
        assert_eq!(Locale::negotiate(Some("fr-FR, de;q=0.9, es;q=0.1")), Locale::Es);
        assert_eq!(Locale::negotiate(Some("fr, *;q=0.5")), Locale::En);
    }

    #[test]
    fn zero_weight_excludes_a_language() {
        assert_eq!(Locale::negotiate(Some("es;q=0, en;q=0.1")), Locale::En);
    }

    #[test]
    fn messages_render_per_locale() {
        let msg = Msg::SignedUp {
            email: "ana@mergington.edu".into(),
            activity: "Chess Club".into(),
        };
        assert_eq!(
            msg.render(Locale::En),
            "Successfully signed up ana@mergington.edu for Chess Club"
        );
        assert_eq!(
            msg.render(Locale::Es),
            "ana@mergington.edu se inscribió correctamente en Chess Club"
        );
        assert_eq!(Msg::ActivityFull.render(Locale::Es), "La actividad está completa");
    }
}
