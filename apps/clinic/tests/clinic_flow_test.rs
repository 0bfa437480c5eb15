use assert_matches::assert_matches;
use chrono::{Duration, NaiveDate};

use appointment_cell::AppointmentStatus;
use clinic_core::Clinic;
use doctor_cell::DoctorProfile;
use medical_record_cell::ClinicalNotes;
use patient_cell::PatientProfile;
use shared_models::ClinicError;
use shared_utils::test_utils::{init_test_tracing, utc, TestConfig, TestUser};

fn patient_profile() -> PatientProfile {
    PatientProfile {
        date_of_birth: NaiveDate::from_ymd_opt(2001, 1, 9).expect("valid date"),
        gender: "Non-binary".to_string(),
        address: Some("7 Mill Lane, Cork".to_string()),
        emergency_contact: None,
        blood_group: Some("AB-".to_string()),
        allergies: None,
        medical_history: None,
    }
}

fn doctor_profile() -> DoctorProfile {
    DoctorProfile {
        specialization: "Orthopaedics".to_string(),
        qualification: "FRCS (Tr & Orth)".to_string(),
        experience_years: 20,
        department: "Fracture Clinic".to_string(),
        consultation_fee: 150.0,
        working_hours: Some("Tue, Thu 09:00-13:00".to_string()),
        available: true,
    }
}

#[tokio::test]
async fn test_visit_lifecycle_across_cells() {
    init_test_tracing();
    let clinic = Clinic::in_memory(TestConfig::default().to_arc()).expect("wire clinic");

    let patient = clinic
        .patients
        .create_patient(patient_profile(), TestUser::patient("alex").to_credentials())
        .await
        .unwrap();
    let doctor = clinic
        .doctors
        .create_doctor(doctor_profile(), TestUser::doctor("dr_ryan").to_credentials())
        .await
        .unwrap();

    let t = utc(2031, 1, 14, 9, 30);
    let visit = clinic
        .appointments
        .create_appointment(patient.patient.id, doctor.doctor.id, t, "Wrist pain after fall")
        .await
        .unwrap();

    assert_matches!(
        clinic
            .appointments
            .create_appointment(patient.patient.id, doctor.doctor.id, t + Duration::minutes(45), "Second opinion")
            .await,
        Err(ClinicError::Conflict(_))
    );

    clinic
        .appointments
        .update_status(visit.id, AppointmentStatus::Completed)
        .await
        .unwrap();

    let record = clinic
        .records
        .create_record(
            patient.patient.id,
            doctor.doctor.id,
            Some(visit.id),
            ClinicalNotes {
                diagnosis: "Scaphoid fracture".to_string(),
                treatment: Some("Cast for six weeks".to_string()),
                visit_date: Some(t),
                ..ClinicalNotes::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(record.appointment_id, Some(visit.id));

    // Deleting the patient removes its identity but leaves the visit history.
    clinic.patients.delete_patient(patient.patient.id).await.unwrap();
    assert_matches!(clinic.identities.find(patient.user.id).await, Err(ClinicError::NotFound(_)));
    assert_eq!(clinic.appointments.get_appointment(visit.id).await.unwrap().status, AppointmentStatus::Completed);
    assert_eq!(clinic.records.list_by_patient(patient.patient.id).await.unwrap().len(), 1);

    assert_matches!(
        clinic
            .appointments
            .create_appointment(patient.patient.id, doctor.doctor.id, t + Duration::days(7), "Cast check")
            .await,
        Err(ClinicError::NotFound(_))
    );
}

#[tokio::test]
async fn test_config_drives_scheduling_policy() {
    init_test_tracing();
    let narrow = TestConfig {
        conflict_window_minutes: 15,
        ..TestConfig::default()
    };
    let clinic = Clinic::in_memory(narrow.to_arc()).expect("wire clinic");

    let patient = clinic
        .patients
        .create_patient(patient_profile(), TestUser::patient("sam").to_credentials())
        .await
        .unwrap();
    let doctor = clinic
        .doctors
        .create_doctor(doctor_profile(), TestUser::doctor("dr_flynn").to_credentials())
        .await
        .unwrap();

    let t = utc(2031, 2, 3, 14, 0);
    let first = clinic
        .appointments
        .create_appointment(patient.patient.id, doctor.doctor.id, t, "Review")
        .await
        .unwrap();
    clinic
        .appointments
        .create_appointment(patient.patient.id, doctor.doctor.id, t + Duration::minutes(20), "Physio plan")
        .await
        .expect("twenty minutes is outside a fifteen minute window");

    clinic
        .appointments
        .update_status(first.id, AppointmentStatus::Completed)
        .await
        .unwrap();
    let reopened = clinic
        .appointments
        .update_status(first.id, AppointmentStatus::Scheduled)
        .await
        .unwrap();
    assert_eq!(reopened.status, AppointmentStatus::Scheduled);
}
