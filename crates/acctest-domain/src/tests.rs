#[cfg(test)]
mod tests {
    use crate::types::*;
    use crate::Quantity;

    fn q(s: &str) -> Quantity {
        Quantity::parse(s).unwrap()
    }

    fn basic_spec() -> ResourceSpec {
        let mut hw = ContainerSpec::new("hw", "microsoft/aci-helloworld:latest", q("0.5"), q("0.5"));
        hw.ports.push(PortSpec::tcp(80));
        ResourceSpec {
            name: "acctestcontainergroup-1".into(),
            resource_group: "acctestRG-1".into(),
            location: "westus".into(),
            os_type: OsType::Linux,
            network: Some(NetworkIdentity { public_ip: true, dns_name_label: None }),
            restart_policy: RestartPolicy::default(),
            containers: vec![hw],
            registry_credentials: vec![],
            tags: Default::default(),
        }
    }

    #[test]
    fn quantity_equality_is_rational() {
        assert_eq!(q("2.0"), q("2"));
        assert_eq!(q("0.50"), q("0.5"));
        assert_ne!(q("3.5"), q("3.05"));
    }

    #[test]
    fn quantity_display_is_canonical() {
        assert_eq!(q("0.5").to_string(), "0.5");
        assert_eq!(q("2.0").to_string(), "2");
        assert_eq!(q("1.50").to_string(), "1.5");
        assert_eq!(q(".25").to_string(), "0.25");
    }

    #[test]
    fn quantity_rejects_non_positive_and_garbage() {
        assert!(Quantity::parse("0").is_err());
        assert!(Quantity::parse("0.0").is_err());
        assert!(Quantity::parse("-1").is_err());
        assert!(Quantity::parse("1.2.3").is_err());
        assert!(Quantity::parse("").is_err());
        assert!(Quantity::parse("1e3").is_err());
    }

    #[test]
    fn quantity_from_provider_float() {
        assert_eq!(Quantity::from_f64(1.5).unwrap(), q("1.5"));
        assert_eq!(Quantity::from_f64(2.0).unwrap(), q("2.0"));
        assert!(Quantity::from_f64(0.0).is_err());
    }

    #[test]
    fn protocol_parsing_ignores_case_and_defaults_to_tcp() {
        assert_eq!("udp".parse::<Protocol>().unwrap(), Protocol::Udp);
        assert_eq!("TCP".parse::<Protocol>().unwrap(), Protocol::Tcp);
        assert_eq!(Protocol::default(), Protocol::Tcp);
        assert!("sctp".parse::<Protocol>().is_err());
    }

    #[test]
    fn os_type_and_restart_policy_parse() {
        assert_eq!("windows".parse::<OsType>().unwrap(), OsType::Windows);
        assert_eq!("OnFailure".parse::<RestartPolicy>().unwrap(), RestartPolicy::OnFailure);
        assert_eq!(RestartPolicy::OnFailure.to_string(), "OnFailure");
    }

    #[test]
    fn secret_is_never_printed() {
        let s = Secret::new("yourpassword");
        assert!(!format!("{:?}", s).contains("yourpassword"));
        assert!(!s.to_string().contains("yourpassword"));
        assert_eq!(s.expose(), "yourpassword");
    }

    #[test]
    fn identity_display() {
        assert_eq!(ResourceIdentity::new("rg", "cg").to_string(), "rg/cg");
    }

    #[test]
    fn valid_spec_passes() {
        basic_spec().validate().unwrap();
    }

    #[test]
    fn duplicate_container_rejected() {
        let mut spec = basic_spec();
        spec.containers.push(spec.containers[0].clone());
        assert!(spec.validate().is_err());
    }

    #[test]
    fn port_zero_rejected() {
        let mut spec = basic_spec();
        spec.containers[0].ports.push(PortSpec::tcp(0));
        assert!(spec.validate().is_err());
    }

    #[test]
    fn dns_label_requires_public_ip() {
        let mut spec = basic_spec();
        spec.network = Some(NetworkIdentity {
            public_ip: false,
            dns_name_label: Some("label".into()),
        });
        assert!(spec.validate().is_err());
    }

    #[test]
    fn empty_containers_rejected() {
        let mut spec = basic_spec();
        spec.containers.clear();
        assert!(spec.validate().is_err());
    }

    #[test]
    fn quantity_ignores_insignificant_zeros() {
        assert_eq!(q("1.00000000000000000000"), q("1"));
        assert_eq!(q("000000000000000000000.5"), q("0.5"));
        assert_eq!(q("12345678901234567.10000000000000000000").to_string(), "12345678901234567.1");
    }

    #[test]
    fn enums_deserialize_in_any_case_and_serialize_canonically() {
        let port: PortSpec = serde_json::from_str(r#"{"port":5443,"protocol":"udp"}"#).unwrap();
        assert_eq!(port, PortSpec::udp(5443));
        assert_eq!(serde_json::to_string(&port).unwrap(), r#"{"port":5443,"protocol":"UDP"}"#);

        let os: OsType = serde_json::from_str("\"linux\"").unwrap();
        assert_eq!(os, OsType::Linux);
        assert_eq!(serde_json::to_string(&os).unwrap(), "\"Linux\"");

        let policy: RestartPolicy = serde_json::from_str("\"onfailure\"").unwrap();
        assert_eq!(policy, RestartPolicy::OnFailure);

        assert!(serde_json::from_str::<Protocol>("\"sctp\"").is_err());
    }
}
