use anyhow::Result;
use pytta_defaults::{defaults, install_defaults, PropertyStore, PropsError, StaticDeviceBackend};
use serde_json::json;
use std::sync::Arc;
use std::thread;

// 全域狀態在同一個測試執行檔內共享，所以只用一個測試函式依序驗證
#[test]
fn test_process_wide_defaults() -> Result<()> {
    let addresses: Vec<usize> = (0..8)
        .map(|_| thread::spawn(|| defaults() as *const _ as usize))
        .collect::<Vec<_>>()
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();
    assert!(addresses.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(addresses[0], defaults() as *const _ as usize);

    let late = install_defaults(PropertyStore::new(Arc::new(StaticDeviceBackend::default())));
    assert!(matches!(late, Err(PropsError::AlreadyInitialized)));

    defaults().set_values([("fftDegree", json!(12)), ("comment", json!("global"))])?;
    let seen = thread::spawn(|| defaults().snapshot().unwrap().fft_degree())
        .join()
        .unwrap();
    assert_eq!(seen, 12);
    assert_eq!(defaults().get("numSamples")?, json!(4096));

    defaults().reset()?;
    assert_eq!(defaults().snapshot()?.fft_degree(), 18);
    assert_eq!(defaults().get("comment")?, json!("No comments."));

    Ok(())
}
