//! Delegation Inspector Tests

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use crate::codec::Address;
    use crate::delegation::*;
    use crate::error::{Eip7702Error, FetchError};
    use crate::utils::crypto::{keccak256, KECCAK_EMPTY};

    fn fixed(code: Vec<u8>) -> impl Fn(&Address) -> Result<Vec<u8>, FetchError> {
        move |_: &Address| Ok(code.clone())
    }

    #[test]
    fn test_delegated_code_detected() {
        let code = delegation_code(&[0xbb; 20]);
        let status = inspect(&[0xaa; 20], &fixed(code.clone())).unwrap();

        assert!(status.is_delegated);
        assert_eq!(status.delegate_address, Some([0xbb; 20]));
        assert_eq!(status.code_hash, keccak256(&code));
        assert_eq!(status.code_kind(), CodeKind::Delegated);
        assert!(status.delegates_to(&[0xbb; 20]));
    }

    #[test]
    fn test_empty_code_not_delegated() {
        let status = inspect(&[0xaa; 20], &fixed(vec![])).unwrap();

        assert!(!status.is_delegated);
        assert_eq!(status.delegate_address, None);
        assert_eq!(status.code_hash, KECCAK_EMPTY);
        assert_eq!(status.code_kind(), CodeKind::Empty);
    }

    #[test]
    fn test_contract_code_not_delegated() {
        let bytecode = hex::decode("6080604052348015600f57600080fd5b50").unwrap();
        let status = inspect(&[0xaa; 20], &fixed(bytecode.clone())).unwrap();

        assert!(!status.is_delegated);
        assert_eq!(status.code_hash, keccak256(&bytecode));
        assert_eq!(status.code_kind(), CodeKind::Contract);
    }

    #[test]
    fn test_truncated_designator_is_contract_code() {
        let code = delegation_code(&[0xbb; 20]);
        assert_eq!(parse_delegation(&code[..22]), None);
        assert_eq!(parse_delegation(&code[..3]), None);

        let mut wrong_version = code.clone();
        wrong_version[2] = 0x01;
        assert_eq!(parse_delegation(&wrong_version), None);
    }

    #[test]
    fn test_zero_delegate_still_parses() {
        let code = delegation_code(&[0u8; 20]);
        assert_eq!(code.len(), DELEGATION_CODE_LEN);
        assert_eq!(parse_delegation(&code), Some([0u8; 20]));
    }

    #[test]
    fn test_fetch_error_propagates_unchanged() {
        let failing = |_: &Address| -> Result<Vec<u8>, FetchError> {
            Err(FetchError::Rpc { code: -32000, message: "header not found".to_string() })
        };

        match inspect(&[0xaa; 20], &failing) {
            Err(Eip7702Error::Fetch(FetchError::Rpc { code, message })) => {
                assert_eq!(code, -32000);
                assert_eq!(message, "header not found");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_inspect_fetches_exactly_once() {
        let calls = Cell::new(0);
        let counting = |_: &Address| -> Result<Vec<u8>, FetchError> {
            calls.set(calls.get() + 1);
            Err(FetchError::Timeout)
        };

        assert!(inspect(&[0xaa; 20], &counting).is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_inspection_is_idempotent() {
        let fetcher = fixed(delegation_code(&[0xcc; 20]));
        let first = inspect(&[0xaa; 20], &fetcher).unwrap();
        let second = inspect(&[0xaa; 20], &fetcher).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_status_json_shape() {
        let status = DelegationStatus::from_code(&delegation_code(&[0xbb; 20]));
        let json = serde_json::to_value(&status).unwrap();

        assert_eq!(json["isDelegated"], true);
        assert_eq!(json["delegateAddress"], "0xbBbBBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbB");
        assert!(json["codeHash"].as_str().unwrap().starts_with("0x"));

        let empty = serde_json::to_value(DelegationStatus::from_code(&[])).unwrap();
        assert!(empty["delegateAddress"].is_null());
    }

    #[test]
    fn test_decorators_compose_with_inspect() {
        let fetcher = CachingFetcher::new(
            RetryingFetcher::new(fixed(delegation_code(&[0xdd; 20])), 3, std::time::Duration::ZERO),
            std::time::Duration::from_secs(30),
        );
        let status = inspect(&[0xaa; 20], &fetcher).unwrap();
        assert_eq!(status.delegate_address, Some([0xdd; 20]));
    }
}
