use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(
    example = json!({
        "rollNumber": "2023001",
        "name": "Rahul Sharma",
        "class": "CS-A",
        "parentContact": "9876543210"
    })
)]
pub struct Student {
    #[schema(example = "2023001")]
    pub roll_number: String,

    #[schema(example = "Rahul Sharma")]
    pub name: String,

    #[serde(rename = "class")]
    #[schema(example = "CS-A")]
    pub class_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "9876543210", nullable = true)]
    pub parent_contact: Option<String>,
}

impl Student {
    pub fn new(roll_number: &str, name: &str, class_name: &str, parent_contact: Option<&str>) -> Self {
        Self {
            roll_number: roll_number.to_string(),
            name: name.to_string(),
            class_name: class_name.to_string(),
            parent_contact: parent_contact.map(str::to_string),
        }
    }
}

/// Demo roster inserted by the seed endpoint when the registry is empty.
pub fn sample_students() -> Vec<Student> {
    [
        ("2023001", "Rahul Sharma", "9876543210"),
        ("2023002", "Priya Singh", "9876543211"),
        ("2023003", "Amit Kumar", "9876543212"),
        ("2023004", "Sneha Patel", "9876543213"),
        ("2023005", "Rohit Gupta", "9876543214"),
        ("2023006", "Anjali Verma", "9876543215"),
        ("2023007", "Vikash Singh", "9876543216"),
        ("2023008", "Pooja Jain", "9876543217"),
        ("2023009", "Arjun Reddy", "9876543218"),
        ("2023010", "Kavya Nair", "9876543219"),
    ]
    .into_iter()
    .map(|(roll, name, contact)| Student::new(roll, name, "CS-A", Some(contact)))
    .collect()
}
