use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Subcommand;
use futures::future::try_join_all;
use tracing::{info, warn};

use auth_cell::{AuthService, DoctorReviewService, RegisterDoctorRequest};
use patient_cell::models::{filter_by_status, DashboardStats, Patient, PatientStatus, UploadBundle, UploadKind};
use patient_cell::services::upload::load_upload_file;
use patient_cell::{PatientService, UploadService};
use shared_config::AppConfig;
use shared_gateway::BackendClient;
use shared_models::{AuthState, UserType};
use slot_booking_cell::models::{BookingEntry, GridCell, MonthJump, PollMode};
use slot_booking_cell::{
    AvailabilityPoller, BackendSlotGateway, BookingViewConfig, CalendarState, Clock, PollerConfig,
    SlotBookingView, SlotGateway, SystemClock, VisibleMonth,
};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and remember the session
    Login {
        #[arg(long, default_value = "doctor")]
        role: UserType,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    Whoami,
    /// Submit a doctor registration for review
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        phone: String,
        #[arg(long, default_value = "")]
        specialization: String,
    },
    ResetPassword {
        #[arg(long, default_value = "doctor")]
        role: UserType,
        #[arg(long)]
        email: String,
        #[arg(long)]
        new_password: String,
    },
    /// Month grid; YYYY-MM, defaults to the current month
    Calendar { month: Option<String> },
    /// Slot board for one day (YYYY-MM-DD)
    Slots { date: String },
    /// Book <time> on <date> for a patient
    Book {
        patient_id: String,
        date: String,
        time: String,
    },
    Patients {
        #[arg(long)]
        status: Option<PatientStatus>,
    },
    Upload {
        patient_id: String,
        #[arg(long)]
        video: Option<PathBuf>,
        #[arg(long)]
        report: Option<PathBuf>,
        #[arg(long = "photo")]
        photos: Vec<PathBuf>,
    },
    PendingDoctors,
    Approve { doctor_id: String },
    Decline { doctor_id: String },
}

pub async fn run(command: Command, client: Arc<BackendClient>, config: &AppConfig) -> anyhow::Result<()> {
    match command {
        Command::Login { role, email, password } => {
            let auth = AuthService::new(client).login(role, &email, &password).await?;
            println!("Logged in as {} ({})", auth.user.display_name(), auth.user_type);
        }
        Command::Logout => {
            AuthService::new(client).logout()?;
            println!("Logged out");
        }
        Command::Whoami => match client.session().current() {
            Some(auth) => println!("{} ({}, id {})", auth.user.display_name(), auth.user_type, auth.user.id),
            None => println!("Not logged in"),
        },
        Command::Register {
            name,
            email,
            password,
            phone,
            specialization,
        } => {
            let request = RegisterDoctorRequest {
                name,
                email,
                password,
                phone,
                specialization,
            };
            let message = AuthService::new(client).register_doctor(request).await?;
            println!("{}", message.as_deref().unwrap_or("Registration submitted for approval"));
        }
        Command::ResetPassword {
            role,
            email,
            new_password,
        } => {
            AuthService::new(client).reset_password(role, &email, &new_password).await?;
            println!("Password updated");
        }
        Command::Calendar { month } => print_calendar(month.as_deref(), config)?,
        Command::Slots { date } => print_slots(client, config, &date).await?,
        Command::Book { patient_id, date, time } => book(client, config, &patient_id, &date, &time).await?,
        Command::Patients { status } => list_patients(client, status).await?,
        Command::Upload {
            patient_id,
            video,
            report,
            photos,
        } => upload(client, &patient_id, video, report, photos).await?,
        Command::PendingDoctors => {
            let doctors = DoctorReviewService::new(client).pending_doctors().await?;
            if doctors.is_empty() {
                println!("No doctors awaiting approval");
            }
            for doctor in doctors {
                println!(
                    "{:>6}  {:<24} {:<32} {}",
                    doctor.id,
                    doctor.name,
                    doctor.email,
                    doctor.specialization.as_deref().unwrap_or("-")
                );
            }
        }
        Command::Approve { doctor_id } => {
            DoctorReviewService::new(client).approve(&doctor_id).await?;
            println!("Doctor {} approved", doctor_id);
        }
        Command::Decline { doctor_id } => {
            DoctorReviewService::new(client).decline(&doctor_id).await?;
            println!("Doctor {} declined", doctor_id);
        }
    }

    Ok(())
}

fn print_calendar(month: Option<&str>, config: &AppConfig) -> anyhow::Result<()> {
    let today = SystemClock.today();
    let mut calendar = CalendarState::new(today, BookingViewConfig::from_app_config(config).closed_weekday);

    if let Some(raw) = month {
        let target: VisibleMonth = raw.parse()?;
        if calendar.jump_to(target.year(), target.month0(), today) == MonthJump::Rejected {
            bail!("{} is before the current month", target);
        }
    }

    println!("{:^28}", calendar.visible_month().label());
    println!(" Sun Mon Tue Wed Thu Fri Sat");

    let mut line = String::new();
    for (index, cell) in calendar.cells(today).enumerate() {
        match cell {
            GridCell::Padding { .. } => line.push_str("    "),
            GridCell::Day(day) => {
                let marker = if day.selectable() { ' ' } else { '-' };
                line.push_str(&format!(" {:>2}{}", day.day_of_month, marker));
            }
        }
        if index % 7 == 6 {
            println!("{}", line.trim_end());
            line.clear();
        }
    }
    if !line.is_empty() {
        println!("{}", line.trim_end());
    }

    Ok(())
}

async fn print_slots(client: Arc<BackendClient>, config: &AppConfig, date: &str) -> anyhow::Result<()> {
    let gateway: Arc<dyn SlotGateway> = Arc::new(BackendSlotGateway::new(client));
    let poller = AvailabilityPoller::new(gateway, Arc::new(SystemClock), PollerConfig::from_app_config(config));

    poller.refresh(date, PollMode::Foreground).await?;
    let day = poller.day_slots(date).await;

    if day.slots.is_empty() {
        println!("No slots on {}", date);
        return Ok(());
    }

    println!("{} ({} open)", day.date, day.selectable_count());
    for slot in &day.slots {
        let state = if slot.disabled_because_time_passed {
            "passed"
        } else if slot.available {
            "open"
        } else {
            "booked"
        };
        println!("  {}  {}", slot.time, state);
    }

    Ok(())
}

async fn book(
    client: Arc<BackendClient>,
    config: &AppConfig,
    patient_id: &str,
    date: &str,
    time: &str,
) -> anyhow::Result<()> {
    let auth = client.session().require()?;
    let patient = PatientService::new(Arc::clone(&client))
        .details(patient_id)
        .await
        .with_context(|| format!("loading patient {}", patient_id))?;

    let mut view = SlotBookingView::new(
        booking_entry(&patient, &auth),
        Arc::new(BackendSlotGateway::new(client)),
        Arc::new(SystemClock),
        BookingViewConfig::from_app_config(config),
    );

    if let Err(e) = view.mount().await {
        warn!("Initial slot load failed: {}", e);
    }
    if !view.select_date(date).await? {
        bail!("{} is not a bookable day", date);
    }
    view.select_slot(time).await?;

    info!("Booking {} {} for {}", date, time, view.entry().patient_name);
    let report = view.confirm().await?;

    println!("{}: {}", report.outcome.title(), report.outcome.user_message());
    if report.navigation.is_none() {
        bail!("slot was not booked");
    }

    Ok(())
}

/// Slots are always booked under the signed-in user, whoever referred the patient.
fn booking_entry(patient: &Patient, auth: &AuthState) -> BookingEntry {
    BookingEntry {
        patient_id: patient.id.clone(),
        patient_name: patient.name.clone(),
        doctor_id: auth.user.id.clone(),
    }
}

async fn list_patients(client: Arc<BackendClient>, status: Option<PatientStatus>) -> anyhow::Result<()> {
    let auth = client.session().require()?;
    let service = PatientService::new(client);

    let patients = match auth.user_type {
        UserType::Doctor => service.list_for_doctor(&auth.user.id).await?,
        UserType::A1User => service.list_for_a1().await?,
    };

    let stats = DashboardStats::from_patients(&patients);
    println!(
        "{} patients: {} pending, {} slot booked, {} scanned, {} cancelled",
        stats.total, stats.pending, stats.slot_booked, stats.scanned, stats.cancelled
    );

    for patient in filter_by_status(&patients, status) {
        let scheduled = match (&patient.scan_date, &patient.scan_time) {
            (Some(date), Some(time)) => format!("{} {}", date, time),
            _ => "-".to_string(),
        };
        println!(
            "{:>6}  {:<24} {:<12} {}",
            patient.id,
            patient.name,
            patient.status.label(),
            scheduled
        );
    }

    Ok(())
}

async fn upload(
    client: Arc<BackendClient>,
    patient_id: &str,
    video: Option<PathBuf>,
    report: Option<PathBuf>,
    photos: Vec<PathBuf>,
) -> anyhow::Result<()> {
    let auth: AuthState = client.session().require()?;

    let bundle = match auth.user_type {
        UserType::A1User => {
            let video = match video {
                Some(path) => Some(load_upload_file(UploadKind::Video, path).await?),
                None => None,
            };
            let report = match report {
                Some(path) => Some(load_upload_file(UploadKind::Report, path).await?),
                None => None,
            };
            UploadBundle::lab(video, report)
        }
        UserType::Doctor => {
            let files = try_join_all(photos.into_iter().map(|path| load_upload_file(UploadKind::Image, path))).await?;
            UploadBundle::doctor_photos(files)
        }
    };

    UploadService::new(client).upload(patient_id, bundle).await?;
    println!("Files uploaded for patient {}", patient_id);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_models::User;

    #[test]
    fn test_booking_entry_uses_signed_in_user() {
        let patient: Patient = serde_json::from_value(json!({
            "id": 44,
            "doctor_id": 9,
            "name": "Asha Verma",
            "status": "pending"
        }))
        .unwrap();
        let auth = AuthState {
            token: "tok".to_string(),
            user: User {
                id: "3".to_string(),
                name: Some("Dr. Rao".to_string()),
                email: None,
                phone: None,
                specialization: None,
                created_at: None,
            },
            user_type: UserType::Doctor,
        };

        let entry = booking_entry(&patient, &auth);

        assert_eq!(entry.patient_id, "44");
        assert_eq!(entry.patient_name, "Asha Verma");
        assert_eq!(entry.doctor_id, "3");
    }
}
