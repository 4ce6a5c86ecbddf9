//! Procedure numbers.
//!
//! The numbering is append-only: values are never reused or reordered, so
//! a newer client talking to an older server gets a clean "unknown
//! procedure" error rather than a misdispatch.

/// One numbered operation of the remote protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
#[allow(missing_docs)] // variant names mirror the on-wire procedure names
pub enum Procedure {
    /// Open the hypervisor connection for this session.
    Open = 1,
    /// Close the session's hypervisor connection.
    Close = 2,
    /// Name of the hypervisor driver.
    GetType = 3,
    /// Hypervisor version number.
    GetVersion = 4,
    /// Maximum vCPUs supported for a guest type.
    GetMaxVcpus = 5,
    /// Host node topology and memory.
    NodeGetInfo = 6,
    /// Host capabilities XML.
    GetCapabilities = 7,
    DomainAttachDevice = 8,
    DomainCreate = 9,
    DomainCreateLinux = 10,
    DomainDefineXml = 11,
    DomainDestroy = 12,
    DomainDetachDevice = 13,
    DomainGetXmlDesc = 14,
    DomainGetAutostart = 15,
    DomainGetInfo = 16,
    DomainGetMaxMemory = 17,
    DomainGetMaxVcpus = 18,
    DomainGetOsType = 19,
    DomainGetVcpus = 20,
    ListDefinedDomains = 21,
    DomainLookupById = 22,
    DomainLookupByName = 23,
    DomainLookupByUuid = 24,
    NumOfDefinedDomains = 25,
    DomainPinVcpu = 26,
    DomainReboot = 27,
    DomainResume = 28,
    DomainSetAutostart = 29,
    DomainSetMaxMemory = 30,
    DomainSetMemory = 31,
    DomainSetVcpus = 32,
    DomainShutdown = 33,
    DomainSuspend = 34,
    DomainUndefine = 35,
    ListDefinedNetworks = 36,
    ListDomains = 37,
    ListNetworks = 38,
    NetworkCreate = 39,
    NetworkCreateXml = 40,
    NetworkDefineXml = 41,
    NetworkDestroy = 42,
    NetworkDumpXml = 43,
    NetworkGetAutostart = 44,
    NetworkGetBridgeName = 45,
    NetworkLookupByName = 46,
    NetworkLookupByUuid = 47,
    NetworkSetAutostart = 48,
    NetworkUndefine = 49,
    NumOfDefinedNetworks = 50,
    NumOfDomains = 51,
    NumOfNetworks = 52,
    DomainCoreDump = 53,
    DomainRestore = 54,
    DomainSave = 55,
    DomainGetSchedulerType = 56,
    DomainGetSchedulerParameters = 57,
    DomainSetSchedulerParameters = 58,
    GetHostname = 59,
    SupportsFeature = 60,
    DomainMigratePrepare = 61,
    DomainMigratePerform = 62,
    DomainMigrateFinish = 63,
    DomainBlockStats = 64,
    DomainInterfaceStats = 65,
    /// Advertise the authentication scheme this server requires.
    AuthList = 66,
    /// Create the SASL context and return the mechanism list.
    AuthSaslInit = 67,
    /// First round of the SASL exchange, selecting a mechanism.
    AuthSaslStart = 68,
    /// Subsequent rounds of the SASL exchange.
    AuthSaslStep = 69,
}

impl Procedure {
    /// Maps a wire procedure number onto a `Procedure`, or `None` when this
    /// server does not know the number.
    pub fn from_i32(v: i32) -> Option<Self> {
        use Procedure::*;

        let p = match v {
            1 => Open,
            2 => Close,
            3 => GetType,
            4 => GetVersion,
            5 => GetMaxVcpus,
            6 => NodeGetInfo,
            7 => GetCapabilities,
            8 => DomainAttachDevice,
            9 => DomainCreate,
            10 => DomainCreateLinux,
            11 => DomainDefineXml,
            12 => DomainDestroy,
            13 => DomainDetachDevice,
            14 => DomainGetXmlDesc,
            15 => DomainGetAutostart,
            16 => DomainGetInfo,
            17 => DomainGetMaxMemory,
            18 => DomainGetMaxVcpus,
            19 => DomainGetOsType,
            20 => DomainGetVcpus,
            21 => ListDefinedDomains,
            22 => DomainLookupById,
            23 => DomainLookupByName,
            24 => DomainLookupByUuid,
            25 => NumOfDefinedDomains,
            26 => DomainPinVcpu,
            27 => DomainReboot,
            28 => DomainResume,
            29 => DomainSetAutostart,
            30 => DomainSetMaxMemory,
            31 => DomainSetMemory,
            32 => DomainSetVcpus,
            33 => DomainShutdown,
            34 => DomainSuspend,
            35 => DomainUndefine,
            36 => ListDefinedNetworks,
            37 => ListDomains,
            38 => ListNetworks,
            39 => NetworkCreate,
            40 => NetworkCreateXml,
            41 => NetworkDefineXml,
            42 => NetworkDestroy,
            43 => NetworkDumpXml,
            44 => NetworkGetAutostart,
            45 => NetworkGetBridgeName,
            46 => NetworkLookupByName,
            47 => NetworkLookupByUuid,
            48 => NetworkSetAutostart,
            49 => NetworkUndefine,
            50 => NumOfDefinedNetworks,
            51 => NumOfDomains,
            52 => NumOfNetworks,
            53 => DomainCoreDump,
            54 => DomainRestore,
            55 => DomainSave,
            56 => DomainGetSchedulerType,
            57 => DomainGetSchedulerParameters,
            58 => DomainSetSchedulerParameters,
            59 => GetHostname,
            60 => SupportsFeature,
            61 => DomainMigratePrepare,
            62 => DomainMigratePerform,
            63 => DomainMigrateFinish,
            64 => DomainBlockStats,
            65 => DomainInterfaceStats,
            66 => AuthList,
            67 => AuthSaslInit,
            68 => AuthSaslStart,
            69 => AuthSaslStep,
            _ => return None,
        };

        Some(p)
    }

    /// Whether this procedure may be dispatched before authentication has
    /// completed.
    ///
    /// Everything else is rejected at the gate, before argument decoding.
    pub fn allowed_before_auth(self) -> bool {
        matches!(
            self,
            Self::AuthList | Self::AuthSaslInit | Self::AuthSaslStart | Self::AuthSaslStep
        )
    }
}
