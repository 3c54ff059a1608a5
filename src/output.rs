use tabled::Tabled;

/// Whether a node sits above the drill-down threshold
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UtilizationStatus {
  Ok,
  High,
}

impl std::fmt::Display for UtilizationStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    match *self {
      UtilizationStatus::Ok => write!(f, "OK"),
      UtilizationStatus::High => write!(f, "⚠️ High Usage"),
    }
  }
}

/// One node in the tier-one table
#[derive(Clone, Debug, Tabled)]
pub struct NodeRow {
  #[tabled(rename = "Node Name")]
  pub name: String,
  #[tabled(rename = "Memory Capacity (Mi)")]
  pub capacity_mib: u64,
  #[tabled(rename = "Memory Usage (Mi)")]
  pub usage_mib: u64,
  #[tabled(rename = "Utilization (%)")]
  pub utilization: String,
  #[tabled(rename = "Status")]
  pub status: UtilizationStatus,
}

/// One pod in a per-node tier-two table
#[derive(Clone, Debug, Tabled)]
pub struct PodRow {
  #[tabled(rename = "Pod Name")]
  pub name: String,
  #[tabled(rename = "Namespace")]
  pub namespace: String,
  #[tabled(rename = "Memory Usage (Mi)")]
  pub usage_mib: u64,
}

/// One replica in a controller tier-three table
#[derive(Clone, Debug, Tabled)]
pub struct ControllerRow {
  #[tabled(rename = "Pod Name")]
  pub name: String,
  #[tabled(rename = "Node Name")]
  pub node_name: String,
  #[tabled(rename = "Memory Usage (Mi)")]
  pub usage_mib: u64,
}

pub trait Report {
  fn to_stdout_table(&self) -> String;
}

macro_rules! impl_report {
  ($type:ty, $empty_msg:expr) => {
    impl Report for Vec<$type> {
      fn to_stdout_table(&self) -> String {
        if self.is_empty() {
          return format!("{}\n", $empty_msg);
        }

        let mut table = ::tabled::Table::new(self);
        table.with(::tabled::settings::Style::sharp());

        format!("{table}\n")
      }
    }
  };
}

impl_report!(NodeRow, "No node measurements available");
impl_report!(PodRow, "No pod measurements available");
impl_report!(ControllerRow, "No pod measurements available");
