use std::env;

/// Login name of the user running the monitor.
///
/// Looks the effective uid up in the password database first and falls
/// back to `$USER` / `$USERNAME`. Returns an empty string when neither is
/// available, in which case no process is tagged as owned.
pub fn current_username() -> String {
    if let Some(name) = passwd_name() {
        return name;
    }

    env::var("USER")
        .or_else(|_| env::var("USERNAME"))
        .unwrap_or_else(|_| {
            log::warn!("Could not determine current user");
            String::new()
        })
}

#[cfg(unix)]
fn passwd_name() -> Option<String> {
    use std::ffi::CStr;
    use std::mem::MaybeUninit;

    let uid = unsafe { libc::geteuid() };
    let mut buf = vec![0 as libc::c_char; 4096];
    let mut pwd = MaybeUninit::<libc::passwd>::uninit();
    let mut result: *mut libc::passwd = std::ptr::null_mut();

    let rc = unsafe {
        libc::getpwuid_r(uid, pwd.as_mut_ptr(), buf.as_mut_ptr(), buf.len(), &mut result)
    };
    if rc != 0 || result.is_null() {
        log::debug!("getpwuid_r failed for uid {} (rc {})", uid, rc);
        return None;
    }

    // `result` points into `pwd`, whose strings live in `buf`
    let name = unsafe { CStr::from_ptr((*result).pw_name) };
    let name = name.to_string_lossy().into_owned();
    (!name.is_empty()).then_some(name)
}

#[cfg(not(unix))]
fn passwd_name() -> Option<String> {
    None
}
