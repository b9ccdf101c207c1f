// Connected sensor device identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub id: String,
    pub name: String,
}

impl DeviceInfo {
    pub fn new(id: String, name: String) -> Self {
        // Paired serial bridges often expose no friendly name.
        let name = if name.trim().is_empty() {
            id.clone()
        } else {
            name.trim().to_string()
        };
        Self { id, name }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_name_falls_back_to_id() {
        let device = DeviceInfo::new("hc-05-a1".to_string(), "  ".to_string());
        assert_eq!(device.name, "hc-05-a1");

        let device = DeviceInfo::new("hc-05-a1".to_string(), " Verdex Probe ".to_string());
        assert_eq!(device.name, "Verdex Probe");
    }
}
