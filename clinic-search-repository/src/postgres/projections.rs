//! SQL projections from primary-store tables to search documents.
//!
//! Each projection builds the document body in SQL with `jsonb_build_object`, so the
//! body keys match the index mapping exactly. `jsonb_strip_nulls` drops absent
//! optional fields.

use clinic_search_shared::IndexName;

/// How one index is read from the primary store.
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    /// Table counted by `count()`.
    pub table: &'static str,
    /// `SELECT <id>, <body> FROM ...` without ordering or paging.
    pub select: &'static str,
    /// Primary-key column used to order pages, qualified for `select`.
    pub order_by: &'static str,
    /// Expression matched against the suggestion prefix.
    pub prefix_expr: &'static str,
    /// `FROM` clause for the prefix lookup.
    pub prefix_from: &'static str,
}

const PETS: Projection = Projection {
    table: "pets",
    select: "SELECT p.id, jsonb_strip_nulls(jsonb_build_object(
            'id', p.id, 'name', p.name, 'species', p.species, 'breed', p.breed,
            'description', p.description, 'age', p.age, 'gender', p.gender,
            'color', p.color, 'weight', p.weight, 'microchipId', p.microchip_id,
            'status', p.status, 'tags', to_jsonb(p.tags), 'ownerId', p.owner_id,
            'clinicId', p.clinic_id, 'createdAt', p.created_at, 'updatedAt', p.updated_at
        )) AS body
        FROM pets p",
    order_by: "p.id",
    prefix_expr: "name",
    prefix_from: "pets",
};

const APPOINTMENTS: Projection = Projection {
    table: "appointments",
    select: "SELECT a.id, jsonb_strip_nulls(jsonb_build_object(
            'id', a.id, 'petId', a.pet_id, 'petName', p.name, 'ownerId', a.owner_id,
            'ownerName', u.first_name || ' ' || u.last_name, 'clinicId', a.clinic_id,
            'clinicName', c.name, 'veterinarianName', a.veterinarian_name,
            'appointmentDate', a.appointment_date, 'durationMinutes', a.duration_minutes,
            'appointmentType', a.appointment_type, 'reason', a.reason, 'notes', a.notes,
            'status', a.status, 'priority', a.priority, 'tags', to_jsonb(a.tags),
            'createdAt', a.created_at, 'updatedAt', a.updated_at
        )) AS body
        FROM appointments a
        LEFT JOIN pets p ON p.id = a.pet_id
        LEFT JOIN users u ON u.id = a.owner_id
        LEFT JOIN clinics c ON c.id = a.clinic_id",
    order_by: "a.id",
    prefix_expr: "p.name",
    prefix_from: "appointments a JOIN pets p ON p.id = a.pet_id",
};

const USERS: Projection = Projection {
    table: "users",
    select: "SELECT u.id, jsonb_strip_nulls(jsonb_build_object(
            'id', u.id, 'firstName', u.first_name, 'lastName', u.last_name,
            'fullName', u.first_name || ' ' || u.last_name, 'email', u.email,
            'phone', u.phone, 'role', u.role, 'status', u.status,
            'clinicId', u.clinic_id, 'city', u.city,
            'createdAt', u.created_at, 'updatedAt', u.updated_at
        )) AS body
        FROM users u",
    order_by: "u.id",
    prefix_expr: "first_name || ' ' || last_name",
    prefix_from: "users",
};

const CLINICS: Projection = Projection {
    table: "clinics",
    select: "SELECT c.id, jsonb_strip_nulls(jsonb_build_object(
            'id', c.id, 'name', c.name, 'description', c.description,
            'address', jsonb_strip_nulls(jsonb_build_object(
                'street', c.street, 'city', c.city, 'state', c.state,
                'postalCode', c.postal_code, 'country', c.country
            )),
            'location', CASE WHEN c.latitude IS NULL OR c.longitude IS NULL THEN NULL
                ELSE jsonb_build_object('lat', c.latitude, 'lon', c.longitude) END,
            'phone', c.phone, 'email', c.email, 'website', c.website,
            'services', to_jsonb(c.services), 'specialties', to_jsonb(c.specialties),
            'tags', to_jsonb(c.tags), 'rating', c.rating, 'reviewCount', c.review_count,
            'isEmergency', c.is_emergency, 'status', c.status,
            'createdAt', c.created_at, 'updatedAt', c.updated_at
        )) AS body
        FROM clinics c",
    order_by: "c.id",
    prefix_expr: "name",
    prefix_from: "clinics",
};

const HEALTH_RECORDS: Projection = Projection {
    table: "health_records",
    select: "SELECT h.id, jsonb_strip_nulls(jsonb_build_object(
            'id', h.id, 'petId', h.pet_id, 'petName', p.name, 'ownerId', p.owner_id,
            'clinicId', h.clinic_id, 'veterinarianName', h.veterinarian_name,
            'recordType', h.record_type, 'title', h.title, 'description', h.description,
            'diagnosis', h.diagnosis, 'treatment', h.treatment,
            'medications', to_jsonb(h.medications), 'tags', to_jsonb(h.tags),
            'priority', h.priority, 'status', h.status, 'recordDate', h.record_date,
            'followUpDate', h.follow_up_date,
            'createdAt', h.created_at, 'updatedAt', h.updated_at
        )) AS body
        FROM health_records h
        LEFT JOIN pets p ON p.id = h.pet_id",
    order_by: "h.id",
    prefix_expr: "title",
    prefix_from: "health_records",
};

const FAQS: Projection = Projection {
    table: "faqs",
    select: "SELECT f.id, jsonb_strip_nulls(jsonb_build_object(
            'id', f.id, 'question', f.question, 'answer', f.answer,
            'category', f.category, 'tags', to_jsonb(f.tags), 'language', f.language,
            'isPublished', f.is_published, 'viewCount', f.view_count,
            'helpfulCount', f.helpful_count,
            'createdAt', f.created_at, 'updatedAt', f.updated_at
        )) AS body
        FROM faqs f",
    order_by: "f.id",
    prefix_expr: "question",
    prefix_from: "faqs",
};

pub fn projection_for(index: IndexName) -> Projection {
    match index {
        IndexName::Pets => PETS,
        IndexName::Appointments => APPOINTMENTS,
        IndexName::Users => USERS,
        IndexName::Clinics => CLINICS,
        IndexName::HealthRecords => HEALTH_RECORDS,
        IndexName::Faqs => FAQS,
    }
}

/// Escape `%`, `_` and the escape character itself for a `LIKE ... ESCAPE '\'`
/// pattern.
pub fn escape_like(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
