//! Full-dispatcher tests: framed requests in, framed replies out, with
//! in-memory hypervisor and SASL collaborators recording every call.

use std::{
    cell::RefCell,
    io::{Cursor, Write},
    rc::Rc,
};

use virtrpc::{
    dispatch_request,
    proto::{
        self, code, AuthSaslInitRet, AuthSaslRet, AuthSaslStartArgs, AuthSaslStepArgs,
        BlockStats, DomainArgs, DomainInfo, DomainRef, DomainSetSchedParamsArgs, ErrorRecord,
        GetHostnameRet, InterfaceStats, ListDomainsArgs, NodeInfo, OpenArgs, SchedParam,
        SchedValue, VcpuInfo,
    },
    unwrap_frame, AuthType, DomainIdent, Envelope, FatalError, FrameWriter, Hypervisor, HvError,
    NetworkIdent, Procedure, SaslBackend, SaslError, SaslSession, SaslStep, Session,
    SessionConfig, SessionMode, DIRECTION_CALL, OPEN_READONLY, REMOTE_DOMAIN_ID_LIST_MAX,
    REMOTE_PROGRAM, REMOTE_PROTOCOL_VERSION, STATUS_ERROR, STATUS_OK,
};

const GUEST_UUID: [u8; 16] = [
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e,
    0x0f,
];

#[derive(Debug, Clone)]
struct MockDomain {
    name: String,
    uuid: [u8; 16],
    id: i32,
}

impl DomainIdent for MockDomain {
    fn name(&self) -> &str {
        &self.name
    }

    fn uuid(&self) -> &[u8; 16] {
        &self.uuid
    }

    fn id(&self) -> i32 {
        self.id
    }
}

#[derive(Debug, Clone)]
struct MockNetwork {
    name: String,
    uuid: [u8; 16],
}

impl NetworkIdent for MockNetwork {
    fn name(&self) -> &str {
        &self.name
    }

    fn uuid(&self) -> &[u8; 16] {
        &self.uuid
    }
}

#[derive(Debug)]
struct MockConn;

/// Everything the dispatcher asked of the hypervisor.
#[derive(Debug, Default)]
struct HvCalls {
    open_flags: Vec<u32>,
    closes: u32,
    list_domains: u32,
    hostname_queries: u32,
    domains_acquired: u32,
    domains_released: u32,
    destroyed: Vec<String>,
    sched_updates: Vec<Vec<SchedParam>>,
}

#[derive(Debug, Default)]
struct MockHv {
    calls: RefCell<HvCalls>,
    fail_close: bool,
    fail_destroy: bool,
    huge_xml: bool,
}

impl MockHv {
    fn guest(&self) -> MockDomain {
        MockDomain {
            name: "build-vm".to_owned(),
            uuid: GUEST_UUID,
            id: 3,
        }
    }

    fn acquire(&self, dom: MockDomain) -> MockDomain {
        self.calls.borrow_mut().domains_acquired += 1;
        dom
    }

    fn not_found(&self) -> HvError {
        HvError::new(code::NO_DOMAIN, "domain not found")
    }
}

impl Hypervisor for MockHv {
    type Conn = MockConn;
    type Domain = MockDomain;
    type Network = MockNetwork;

    fn open(&self, _name: Option<&str>, flags: u32) -> Result<MockConn, HvError> {
        self.calls.borrow_mut().open_flags.push(flags);
        Ok(MockConn)
    }

    fn close(&self, _conn: &MockConn) -> Result<(), HvError> {
        if self.fail_close {
            return Err(HvError::new(code::OPERATION_FAILED, "close failed"));
        }
        self.calls.borrow_mut().closes += 1;
        Ok(())
    }

    fn get_type(&self, _conn: &MockConn) -> Result<String, HvError> {
        Ok("Mock".to_owned())
    }

    fn get_version(&self, _conn: &MockConn) -> Result<u64, HvError> {
        Ok(2_001_000)
    }

    fn get_hostname(&self, _conn: &MockConn) -> Result<String, HvError> {
        self.calls.borrow_mut().hostname_queries += 1;
        Ok("node0.example".to_owned())
    }

    fn get_capabilities(&self, _conn: &MockConn) -> Result<String, HvError> {
        Ok("<capabilities/>".to_owned())
    }

    fn get_max_vcpus(&self, _conn: &MockConn, _ty: Option<&str>) -> Result<i32, HvError> {
        Ok(16)
    }

    fn node_get_info(&self, _conn: &MockConn) -> Result<NodeInfo, HvError> {
        let mut model = [0; proto::NODE_MODEL_LEN];
        model[..4].copy_from_slice(b"mock");
        Ok(NodeInfo {
            model,
            memory: 8 << 20,
            cpus: 4,
            mhz: 2000,
            nodes: 1,
            sockets: 1,
            cores: 4,
            threads: 1,
        })
    }

    fn supports_feature(&self, _conn: &MockConn, feature: i32) -> Result<bool, HvError> {
        Ok(feature == 1)
    }

    fn list_domains(&self, _conn: &MockConn, maxids: usize) -> Result<Vec<i32>, HvError> {
        self.calls.borrow_mut().list_domains += 1;
        Ok(vec![3].into_iter().take(maxids).collect())
    }

    fn num_of_domains(&self, _conn: &MockConn) -> Result<i32, HvError> {
        Ok(1)
    }

    fn list_defined_domains(
        &self,
        _conn: &MockConn,
        maxnames: usize,
    ) -> Result<Vec<String>, HvError> {
        Ok(vec!["idle-vm".to_owned()].into_iter().take(maxnames).collect())
    }

    fn num_of_defined_domains(&self, _conn: &MockConn) -> Result<i32, HvError> {
        Ok(1)
    }

    fn domain_resolve(
        &self,
        _conn: &MockConn,
        name: &str,
        uuid: &[u8; 16],
    ) -> Result<MockDomain, HvError> {
        let guest = self.guest();
        if name == guest.name && *uuid == guest.uuid {
            Ok(self.acquire(guest))
        } else {
            Err(self.not_found())
        }
    }

    fn domain_lookup_by_id(&self, _conn: &MockConn, id: i32) -> Result<MockDomain, HvError> {
        if id == self.guest().id {
            Ok(self.acquire(self.guest()))
        } else {
            Err(self.not_found())
        }
    }

    fn domain_lookup_by_name(&self, _conn: &MockConn, name: &str) -> Result<MockDomain, HvError> {
        if name == self.guest().name {
            Ok(self.acquire(self.guest()))
        } else {
            Err(self.not_found())
        }
    }

    fn domain_lookup_by_uuid(
        &self,
        _conn: &MockConn,
        uuid: &[u8; 16],
    ) -> Result<MockDomain, HvError> {
        if *uuid == self.guest().uuid {
            Ok(self.acquire(self.guest()))
        } else {
            Err(self.not_found())
        }
    }

    fn release_domain(&self, _dom: MockDomain) {
        self.calls.borrow_mut().domains_released += 1;
    }

    fn domain_create_linux(
        &self,
        _conn: &MockConn,
        _xml: &str,
        _flags: u32,
    ) -> Result<MockDomain, HvError> {
        Ok(self.acquire(self.guest()))
    }

    fn domain_define_xml(&self, _conn: &MockConn, _xml: &str) -> Result<MockDomain, HvError> {
        Ok(self.acquire(self.guest()))
    }

    fn domain_undefine(&self, _conn: &MockConn, _dom: &MockDomain) -> Result<(), HvError> {
        Ok(())
    }

    fn domain_create(&self, _conn: &MockConn, _dom: &MockDomain) -> Result<(), HvError> {
        Ok(())
    }

    fn domain_destroy(&self, _conn: &MockConn, dom: &MockDomain) -> Result<(), HvError> {
        if self.fail_destroy {
            return Err(HvError::new(code::OPERATION_FAILED, "destroy failed"));
        }
        self.calls.borrow_mut().destroyed.push(dom.name.clone());
        Ok(())
    }

    fn domain_shutdown(&self, _conn: &MockConn, _dom: &MockDomain) -> Result<(), HvError> {
        Ok(())
    }

    fn domain_reboot(
        &self,
        _conn: &MockConn,
        _dom: &MockDomain,
        _flags: u32,
    ) -> Result<(), HvError> {
        Ok(())
    }

    fn domain_suspend(&self, _conn: &MockConn, _dom: &MockDomain) -> Result<(), HvError> {
        Ok(())
    }

    fn domain_resume(&self, _conn: &MockConn, _dom: &MockDomain) -> Result<(), HvError> {
        Ok(())
    }

    fn domain_save(&self, _conn: &MockConn, _dom: &MockDomain, _to: &str) -> Result<(), HvError> {
        Ok(())
    }

    fn domain_restore(&self, _conn: &MockConn, _from: &str) -> Result<(), HvError> {
        Ok(())
    }

    fn domain_core_dump(
        &self,
        _conn: &MockConn,
        _dom: &MockDomain,
        _to: &str,
        _flags: u32,
    ) -> Result<(), HvError> {
        Ok(())
    }

    fn domain_attach_device(
        &self,
        _conn: &MockConn,
        _dom: &MockDomain,
        _xml: &str,
    ) -> Result<(), HvError> {
        Ok(())
    }

    fn domain_detach_device(
        &self,
        _conn: &MockConn,
        _dom: &MockDomain,
        _xml: &str,
    ) -> Result<(), HvError> {
        Ok(())
    }

    fn domain_get_info(&self, _conn: &MockConn, _dom: &MockDomain) -> Result<DomainInfo, HvError> {
        Ok(DomainInfo {
            state: 1,
            max_mem: 1 << 20,
            memory: 1 << 19,
            nr_virt_cpu: 2,
            cpu_time: 123_456_789,
        })
    }

    fn domain_get_xml_desc(
        &self,
        _conn: &MockConn,
        _dom: &MockDomain,
        _flags: u32,
    ) -> Result<String, HvError> {
        if self.huge_xml {
            Ok("x".repeat(virtrpc::REMOTE_MESSAGE_MAX))
        } else {
            Ok("<domain/>".to_owned())
        }
    }

    fn domain_get_os_type(&self, _conn: &MockConn, _dom: &MockDomain) -> Result<String, HvError> {
        Ok("hvm".to_owned())
    }

    fn domain_get_max_memory(&self, _conn: &MockConn, _dom: &MockDomain) -> Result<u64, HvError> {
        Ok(1 << 20)
    }

    fn domain_set_max_memory(
        &self,
        _conn: &MockConn,
        _dom: &MockDomain,
        _memory: u64,
    ) -> Result<(), HvError> {
        Ok(())
    }

    fn domain_set_memory(
        &self,
        _conn: &MockConn,
        _dom: &MockDomain,
        _memory: u64,
    ) -> Result<(), HvError> {
        Ok(())
    }

    fn domain_get_max_vcpus(&self, _conn: &MockConn, _dom: &MockDomain) -> Result<i32, HvError> {
        Ok(8)
    }

    fn domain_set_vcpus(
        &self,
        _conn: &MockConn,
        _dom: &MockDomain,
        _nvcpus: u32,
    ) -> Result<(), HvError> {
        Ok(())
    }

    fn domain_pin_vcpu(
        &self,
        _conn: &MockConn,
        _dom: &MockDomain,
        _vcpu: u32,
        _cpumap: &[u8],
    ) -> Result<(), HvError> {
        Ok(())
    }

    fn domain_get_vcpus(
        &self,
        _conn: &MockConn,
        _dom: &MockDomain,
        maxinfo: usize,
        maplen: usize,
    ) -> Result<(Vec<VcpuInfo>, Vec<u8>), HvError> {
        let n = maxinfo.min(2);
        let info = (0..n)
            .map(|i| VcpuInfo {
                number: i as u32,
                state: 1,
                cpu_time: 1000 * i as u64,
                cpu: i as i32,
            })
            .collect();
        Ok((info, vec![1; n * maplen]))
    }

    fn domain_get_autostart(&self, _conn: &MockConn, _dom: &MockDomain) -> Result<bool, HvError> {
        Ok(false)
    }

    fn domain_set_autostart(
        &self,
        _conn: &MockConn,
        _dom: &MockDomain,
        _autostart: bool,
    ) -> Result<(), HvError> {
        Ok(())
    }

    fn domain_block_stats(
        &self,
        _conn: &MockConn,
        _dom: &MockDomain,
        _path: &str,
    ) -> Result<BlockStats, HvError> {
        Ok(BlockStats {
            rd_req: 1,
            rd_bytes: 512,
            wr_req: 2,
            wr_bytes: 1024,
            errs: -1,
        })
    }

    fn domain_interface_stats(
        &self,
        _conn: &MockConn,
        _dom: &MockDomain,
        _path: &str,
    ) -> Result<InterfaceStats, HvError> {
        Ok(InterfaceStats {
            rx_bytes: 1,
            rx_packets: 2,
            rx_errs: 0,
            rx_drop: 0,
            tx_bytes: 3,
            tx_packets: 4,
            tx_errs: 0,
            tx_drop: 0,
        })
    }

    fn domain_get_scheduler_type(
        &self,
        _conn: &MockConn,
        _dom: &MockDomain,
    ) -> Result<(String, i32), HvError> {
        Ok(("credit".to_owned(), 2))
    }

    fn domain_get_scheduler_parameters(
        &self,
        _conn: &MockConn,
        _dom: &MockDomain,
        nparams: usize,
    ) -> Result<Vec<SchedParam>, HvError> {
        let params = vec![
            SchedParam {
                field: "weight".to_owned(),
                value: SchedValue::Uint(512),
            },
            SchedParam {
                field: "cap".to_owned(),
                value: SchedValue::Uint(0),
            },
        ];
        Ok(params.into_iter().take(nparams).collect())
    }

    fn domain_set_scheduler_parameters(
        &self,
        _conn: &MockConn,
        _dom: &MockDomain,
        params: &[SchedParam],
    ) -> Result<(), HvError> {
        self.calls.borrow_mut().sched_updates.push(params.to_vec());
        Ok(())
    }

    fn domain_migrate_prepare(
        &self,
        _conn: &MockConn,
        _uri_in: Option<&str>,
        _flags: u64,
        _dname: Option<&str>,
        _resource: u64,
    ) -> Result<(Vec<u8>, Option<String>), HvError> {
        Ok((b"cookie0".to_vec(), Some("tcp://node0/".to_owned())))
    }

    fn domain_migrate_perform(
        &self,
        _conn: &MockConn,
        _dom: &MockDomain,
        _cookie: &[u8],
        _uri: &str,
        _flags: u64,
        _dname: Option<&str>,
        _resource: u64,
    ) -> Result<(), HvError> {
        Ok(())
    }

    fn domain_migrate_finish(
        &self,
        _conn: &MockConn,
        dname: &str,
        _cookie: &[u8],
        _uri: &str,
        _flags: u64,
    ) -> Result<MockDomain, HvError> {
        Ok(self.acquire(MockDomain {
            name: dname.to_owned(),
            uuid: GUEST_UUID,
            id: 4,
        }))
    }

    fn network_resolve(
        &self,
        _conn: &MockConn,
        name: &str,
        uuid: &[u8; 16],
    ) -> Result<MockNetwork, HvError> {
        if name == "default" {
            Ok(MockNetwork {
                name: name.to_owned(),
                uuid: *uuid,
            })
        } else {
            Err(HvError::new(code::NO_NETWORK, "network not found"))
        }
    }

    fn network_lookup_by_name(&self, _conn: &MockConn, name: &str) -> Result<MockNetwork, HvError> {
        Ok(MockNetwork {
            name: name.to_owned(),
            uuid: GUEST_UUID,
        })
    }

    fn network_lookup_by_uuid(
        &self,
        _conn: &MockConn,
        uuid: &[u8; 16],
    ) -> Result<MockNetwork, HvError> {
        Ok(MockNetwork {
            name: "default".to_owned(),
            uuid: *uuid,
        })
    }

    fn release_network(&self, _net: MockNetwork) {}

    fn network_create_xml(&self, _conn: &MockConn, _xml: &str) -> Result<MockNetwork, HvError> {
        Ok(MockNetwork {
            name: "created".to_owned(),
            uuid: GUEST_UUID,
        })
    }

    fn network_define_xml(&self, _conn: &MockConn, _xml: &str) -> Result<MockNetwork, HvError> {
        Ok(MockNetwork {
            name: "defined".to_owned(),
            uuid: GUEST_UUID,
        })
    }

    fn network_undefine(&self, _conn: &MockConn, _net: &MockNetwork) -> Result<(), HvError> {
        Ok(())
    }

    fn network_create(&self, _conn: &MockConn, _net: &MockNetwork) -> Result<(), HvError> {
        Ok(())
    }

    fn network_destroy(&self, _conn: &MockConn, _net: &MockNetwork) -> Result<(), HvError> {
        Ok(())
    }

    fn network_dump_xml(
        &self,
        _conn: &MockConn,
        _net: &MockNetwork,
        _flags: u32,
    ) -> Result<String, HvError> {
        Ok("<network/>".to_owned())
    }

    fn network_get_bridge_name(
        &self,
        _conn: &MockConn,
        _net: &MockNetwork,
    ) -> Result<String, HvError> {
        Ok("virbr0".to_owned())
    }

    fn network_get_autostart(&self, _conn: &MockConn, _net: &MockNetwork) -> Result<bool, HvError> {
        Ok(true)
    }

    fn network_set_autostart(
        &self,
        _conn: &MockConn,
        _net: &MockNetwork,
        _autostart: bool,
    ) -> Result<(), HvError> {
        Ok(())
    }

    fn list_networks(&self, _conn: &MockConn, maxnames: usize) -> Result<Vec<String>, HvError> {
        Ok(vec!["default".to_owned()].into_iter().take(maxnames).collect())
    }

    fn num_of_networks(&self, _conn: &MockConn) -> Result<i32, HvError> {
        Ok(1)
    }

    fn list_defined_networks(
        &self,
        _conn: &MockConn,
        maxnames: usize,
    ) -> Result<Vec<String>, HvError> {
        Ok(Vec::new().into_iter().take(maxnames).collect())
    }

    fn num_of_defined_networks(&self, _conn: &MockConn) -> Result<i32, HvError> {
        Ok(0)
    }
}

/// Scripted SASL backend: `rounds` CONTINUE challenges, then COMPLETE.
/// Every client payload is recorded with its nil-ness intact.
#[derive(Debug, Default)]
struct MockSasl {
    rounds: u32,
    inputs: Rc<RefCell<Vec<Option<Vec<u8>>>>>,
}

#[derive(Debug)]
struct MockSaslSession {
    remaining: u32,
    inputs: Rc<RefCell<Vec<Option<Vec<u8>>>>>,
}

impl SaslBackend for MockSasl {
    type Session = MockSaslSession;

    fn new_session(
        &self,
        service: &str,
        local_addr: Option<&str>,
        remote_addr: Option<&str>,
    ) -> Result<MockSaslSession, SaslError> {
        assert_eq!(service, "virtd");
        // "IP;PORT" channel binding strings from the session addresses.
        assert_eq!(local_addr, Some("127.0.0.1;16509"));
        assert_eq!(remote_addr, Some("127.0.0.1;40000"));

        Ok(MockSaslSession {
            remaining: self.rounds,
            inputs: Rc::clone(&self.inputs),
        })
    }
}

impl MockSaslSession {
    fn round(&mut self, input: Option<&[u8]>) -> Result<SaslStep, SaslError> {
        self.inputs.borrow_mut().push(input.map(<[u8]>::to_vec));

        if self.remaining == 0 {
            Ok(SaslStep::Complete(None))
        } else {
            self.remaining -= 1;
            Ok(SaslStep::Continue(Some(b"challenge".to_vec())))
        }
    }
}

impl SaslSession for MockSaslSession {
    fn mechanism_list(&self) -> Result<String, SaslError> {
        Ok("SCRAM-SHA-256,EXTERNAL".to_owned())
    }

    fn start(&mut self, mechanism: &str, input: Option<&[u8]>) -> Result<SaslStep, SaslError> {
        if mechanism != "EXTERNAL" {
            return Err(SaslError::new("unknown mechanism"));
        }
        self.round(input)
    }

    fn step(&mut self, input: Option<&[u8]>) -> Result<SaslStep, SaslError> {
        self.round(input)
    }
}

fn make_session(readonly: bool, auth: AuthType) -> Session<MockHv, MockSasl> {
    Session::new(SessionConfig {
        readonly,
        tls: false,
        auth,
        local_addr: Some("127.0.0.1:16509".parse().unwrap()),
        remote_addr: Some("127.0.0.1:40000".parse().unwrap()),
    })
}

fn call_frame(procedure: i32, serial: u32, body: &[u8]) -> Vec<u8> {
    let mut frame = FrameWriter::new();
    Envelope {
        program: REMOTE_PROGRAM,
        version: REMOTE_PROTOCOL_VERSION,
        procedure,
        direction: DIRECTION_CALL,
        serial,
        status: STATUS_OK,
    }
    .serialise_into(frame.cursor())
    .unwrap();
    frame.cursor().write_all(body).unwrap();
    frame.finish().unwrap()
}

/// Runs one request through the dispatcher and returns the reply envelope
/// and body.
fn exchange(
    hv: &MockHv,
    sasl: &MockSasl,
    session: &mut Session<MockHv, MockSasl>,
    frame: &[u8],
) -> (Envelope, Vec<u8>) {
    session.append(frame).unwrap();
    assert!(session.request_ready().unwrap());

    dispatch_request(hv, sasl, session).unwrap();
    assert_eq!(session.mode(), SessionMode::Tx);

    let reply = session.pending_reply().to_vec();
    session.reply_drained(reply.len());
    assert_eq!(session.mode(), SessionMode::Rx);

    let body = unwrap_frame(&reply).unwrap();
    let mut c = Cursor::new(body);
    let envelope = Envelope::from_cursor(&mut c).unwrap();
    (envelope, body[c.position() as usize..].to_vec())
}

fn error_record(body: &[u8]) -> ErrorRecord {
    ErrorRecord::from_cursor(&mut Cursor::new(body)).unwrap()
}

fn encode<F: FnOnce(&mut Vec<u8>)>(f: F) -> Vec<u8> {
    let mut body = Vec::new();
    f(&mut body);
    body
}

fn guest_ref() -> DomainRef {
    DomainRef {
        name: "build-vm".to_owned(),
        uuid: GUEST_UUID,
        id: 3,
    }
}

/// Opens the connection on an already-authorized session.
fn open_connection(hv: &MockHv, sasl: &MockSasl, session: &mut Session<MockHv, MockSasl>) {
    let body = encode(|b| OpenArgs { name: None, flags: 0 }.serialise_into(b).unwrap());
    let (envelope, ret) = exchange(hv, sasl, session, &call_frame(Procedure::Open as i32, 1, &body));
    assert_eq!(envelope.status, STATUS_OK);
    assert!(ret.is_empty());
}

// OPEN on a read-only session forces the read-only flag through to the
// hypervisor and replies with an empty body.
#[test]
fn test_open_readonly_projection() {
    let hv = MockHv::default();
    let sasl = MockSasl::default();
    let mut session = make_session(true, AuthType::None);

    let body = encode(|b| OpenArgs { name: None, flags: 0 }.serialise_into(b).unwrap());
    let (envelope, ret) =
        exchange(&hv, &sasl, &mut session, &call_frame(Procedure::Open as i32, 42, &body));

    assert_eq!(envelope.serial, 42);
    assert_eq!(envelope.status, STATUS_OK);
    assert!(ret.is_empty());
    assert_eq!(hv.calls.borrow().open_flags, [OPEN_READONLY]);
}

// An oversize client bound is rejected before the hypervisor is
// invoked, naming the violated constant.
#[test]
fn test_list_domains_bound_rejected() {
    let hv = MockHv::default();
    let sasl = MockSasl::default();
    let mut session = make_session(false, AuthType::None);
    open_connection(&hv, &sasl, &mut session);

    let body = encode(|b| {
        ListDomainsArgs {
            maxids: REMOTE_DOMAIN_ID_LIST_MAX as i32 + 1,
        }
        .serialise_into(b)
        .unwrap()
    });
    let (envelope, ret) = exchange(
        &hv,
        &sasl,
        &mut session,
        &call_frame(Procedure::ListDomains as i32, 2, &body),
    );

    assert_eq!(envelope.status, STATUS_ERROR);
    let rec = error_record(&ret);
    assert_eq!(rec.code, code::RPC);
    assert!(rec
        .message
        .as_deref()
        .unwrap()
        .contains("REMOTE_DOMAIN_ID_LIST_MAX"));
    assert_eq!(hv.calls.borrow().list_domains, 0);
}

// Before authentication, a non-auth procedure is refused without
// touching the hypervisor.
#[test]
fn test_auth_gate_blocks_hostname() {
    let hv = MockHv::default();
    let sasl = MockSasl::default();
    let mut session = make_session(false, AuthType::Sasl);

    let (envelope, ret) = exchange(
        &hv,
        &sasl,
        &mut session,
        &call_frame(Procedure::GetHostname as i32, 3, &[]),
    );

    assert_eq!(envelope.status, STATUS_ERROR);
    let rec = error_record(&ret);
    assert_eq!(rec.message.as_deref(), Some("authentication required"));
    assert_eq!(hv.calls.borrow().hostname_queries, 0);
}

// init -> start(nil) completes, after which the gate is open.
#[test]
fn test_sasl_single_round_authentication() {
    let hv = MockHv::default();
    let sasl = MockSasl::default();
    let mut session = make_session(false, AuthType::Sasl);

    let (envelope, ret) = exchange(
        &hv,
        &sasl,
        &mut session,
        &call_frame(Procedure::AuthSaslInit as i32, 4, &[]),
    );
    assert_eq!(envelope.status, STATUS_OK);
    let init = AuthSaslInitRet::from_cursor(&mut Cursor::new(ret.as_slice())).unwrap();
    assert!(!init.mechlist.is_empty());

    let body = encode(|b| {
        AuthSaslStartArgs {
            mech: "EXTERNAL",
            data: None,
        }
        .serialise_into(b)
        .unwrap()
    });
    let (envelope, ret) = exchange(
        &hv,
        &sasl,
        &mut session,
        &call_frame(Procedure::AuthSaslStart as i32, 5, &body),
    );
    assert_eq!(envelope.status, STATUS_OK);
    let start = AuthSaslRet::from_cursor(&mut Cursor::new(ret.as_slice())).unwrap();
    assert_eq!(start.complete, 1);
    assert!(!session.auth_required());

    // The nil payload arrived as "no payload".
    assert_eq!(sasl.inputs.borrow().as_slice(), [None]);

    open_connection(&hv, &sasl, &mut session);
    let (envelope, ret) = exchange(
        &hv,
        &sasl,
        &mut session,
        &call_frame(Procedure::GetHostname as i32, 6, &[]),
    );
    assert_eq!(envelope.status, STATUS_OK);
    let ret = GetHostnameRet::from_cursor(&mut Cursor::new(ret.as_slice())).unwrap();
    assert_eq!(ret.hostname, "node0.example");
}

// A program mismatch still echoes the call serial.
#[test]
fn test_program_mismatch_echoes_serial() {
    let hv = MockHv::default();
    let sasl = MockSasl::default();
    let mut session = make_session(false, AuthType::None);

    let mut frame = FrameWriter::new();
    Envelope {
        program: REMOTE_PROGRAM ^ 1,
        version: REMOTE_PROTOCOL_VERSION,
        procedure: Procedure::GetType as i32,
        direction: DIRECTION_CALL,
        serial: 909,
        status: STATUS_OK,
    }
    .serialise_into(frame.cursor())
    .unwrap();
    let frame = frame.finish().unwrap();

    let (envelope, ret) = exchange(&hv, &sasl, &mut session, &frame);
    assert_eq!(envelope.serial, 909);
    assert_eq!(envelope.status, STATUS_ERROR);
    assert!(error_record(&ret)
        .message
        .as_deref()
        .unwrap()
        .contains("program mismatch"));
}

// A one-element UINT parameter vector reaches the hypervisor intact.
#[test]
fn test_set_scheduler_parameters_passthrough() {
    let hv = MockHv::default();
    let sasl = MockSasl::default();
    let mut session = make_session(false, AuthType::None);
    open_connection(&hv, &sasl, &mut session);

    let body = encode(|b| {
        DomainSetSchedParamsArgs {
            dom: guest_ref(),
            params: vec![SchedParam {
                field: "weight".to_owned(),
                value: SchedValue::Uint(256),
            }],
        }
        .serialise_into(b)
        .unwrap()
    });
    let (envelope, _) = exchange(
        &hv,
        &sasl,
        &mut session,
        &call_frame(Procedure::DomainSetSchedulerParameters as i32, 7, &body),
    );
    assert_eq!(envelope.status, STATUS_OK);

    let calls = hv.calls.borrow();
    assert_eq!(calls.sched_updates.len(), 1);
    let params = &calls.sched_updates[0];
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].field, "weight");
    assert!(params[0].field.len() <= virtrpc::SCHED_FIELD_LENGTH);
    assert_eq!(params[0].value, SchedValue::Uint(256));
}

// The reply serial always equals the call serial.
#[test]
fn test_serial_echo() {
    let hv = MockHv::default();
    let sasl = MockSasl::default();
    let mut session = make_session(false, AuthType::None);
    open_connection(&hv, &sasl, &mut session);

    for serial in [0, 1, 7777, u32::MAX] {
        let (envelope, _) = exchange(
            &hv,
            &sasl,
            &mut session,
            &call_frame(Procedure::GetType as i32, serial, &[]),
        );
        assert_eq!(envelope.serial, serial);
    }
}

// Per-call handles are released exactly once on every exit path.
#[test]
fn test_handle_released_on_success_and_error() {
    let hv = MockHv::default();
    let sasl = MockSasl::default();
    let mut session = make_session(false, AuthType::None);
    open_connection(&hv, &sasl, &mut session);

    // Success path.
    let body = encode(|b| DomainArgs { dom: guest_ref() }.serialise_into(b).unwrap());
    let (envelope, _) = exchange(
        &hv,
        &sasl,
        &mut session,
        &call_frame(Procedure::DomainSuspend as i32, 8, &body),
    );
    assert_eq!(envelope.status, STATUS_OK);

    {
        let calls = hv.calls.borrow();
        assert_eq!(calls.domains_acquired, 1);
        assert_eq!(calls.domains_released, 1);
    }

    // Lookups pack the handle and release it too.
    let body = encode(|b| {
        proto::DomainLookupByIdArgs { id: 3 }.serialise_into(b).unwrap()
    });
    let (envelope, _) = exchange(
        &hv,
        &sasl,
        &mut session,
        &call_frame(Procedure::DomainLookupById as i32, 9, &body),
    );
    assert_eq!(envelope.status, STATUS_OK);

    let calls = hv.calls.borrow();
    assert_eq!(calls.domains_acquired, 2);
    assert_eq!(calls.domains_released, 2);
}

// The DOMAIN_DESTROY exception: on success the library consumed the
// handle, so the guard must not release it again; on failure it must.
#[test]
fn test_destroy_handle_discipline() {
    let sasl = MockSasl::default();

    let hv = MockHv::default();
    let mut session = make_session(false, AuthType::None);
    open_connection(&hv, &sasl, &mut session);

    let body = encode(|b| DomainArgs { dom: guest_ref() }.serialise_into(b).unwrap());
    let (envelope, _) = exchange(
        &hv,
        &sasl,
        &mut session,
        &call_frame(Procedure::DomainDestroy as i32, 10, &body),
    );
    assert_eq!(envelope.status, STATUS_OK);
    {
        let calls = hv.calls.borrow();
        assert_eq!(calls.destroyed, ["build-vm"]);
        assert_eq!(calls.domains_acquired, 1);
        assert_eq!(calls.domains_released, 0);
    }

    let hv = MockHv {
        fail_destroy: true,
        ..MockHv::default()
    };
    let mut session = make_session(false, AuthType::None);
    open_connection(&hv, &sasl, &mut session);

    let (envelope, ret) = exchange(
        &hv,
        &sasl,
        &mut session,
        &call_frame(Procedure::DomainDestroy as i32, 11, &body),
    );
    assert_eq!(envelope.status, STATUS_ERROR);
    assert_eq!(error_record(&ret).code, code::OPERATION_FAILED);

    let calls = hv.calls.borrow();
    assert_eq!(calls.domains_acquired, 1);
    assert_eq!(calls.domains_released, 1);
}

// Nil and empty SASL payloads stay distinct through the whole stack.
#[test]
fn test_sasl_nil_vs_empty_forwarded() {
    let hv = MockHv::default();
    let sasl = MockSasl {
        rounds: 2,
        ..MockSasl::default()
    };
    let mut session = make_session(false, AuthType::Sasl);

    exchange(
        &hv,
        &sasl,
        &mut session,
        &call_frame(Procedure::AuthSaslInit as i32, 12, &[]),
    );

    let start = encode(|b| {
        AuthSaslStartArgs {
            mech: "EXTERNAL",
            data: None,
        }
        .serialise_into(b)
        .unwrap()
    });
    let (_, ret) = exchange(
        &hv,
        &sasl,
        &mut session,
        &call_frame(Procedure::AuthSaslStart as i32, 13, &start),
    );
    let round = AuthSaslRet::from_cursor(&mut Cursor::new(ret.as_slice())).unwrap();
    assert_eq!(round.complete, 0);
    assert_eq!(round.data.as_deref(), Some(b"challenge".as_slice()));

    let step_empty = encode(|b| {
        AuthSaslStepArgs { data: Some(b"") }.serialise_into(b).unwrap()
    });
    exchange(
        &hv,
        &sasl,
        &mut session,
        &call_frame(Procedure::AuthSaslStep as i32, 14, &step_empty),
    );

    let step_payload = encode(|b| {
        AuthSaslStepArgs {
            data: Some(b"proof"),
        }
        .serialise_into(b)
        .unwrap()
    });
    let (_, ret) = exchange(
        &hv,
        &sasl,
        &mut session,
        &call_frame(Procedure::AuthSaslStep as i32, 15, &step_payload),
    );
    let last = AuthSaslRet::from_cursor(&mut Cursor::new(ret.as_slice())).unwrap();
    assert_eq!(last.complete, 1);
    assert_eq!(last.data, None);

    assert_eq!(
        sasl.inputs.borrow().as_slice(),
        [None, Some(b"".to_vec()), Some(b"proof".to_vec())]
    );
}

// Pre-envelope failures get the blind fallback envelope.
#[test]
fn test_blind_error_fallback() {
    let hv = MockHv::default();
    let sasl = MockSasl::default();
    let mut session = make_session(false, AuthType::None);

    // A frame long enough to parse, too short for an envelope.
    let mut frame = FrameWriter::new();
    frame.cursor().write_all(&[0; 8]).unwrap();
    let frame = frame.finish().unwrap();

    let (envelope, ret) = exchange(&hv, &sasl, &mut session, &frame);
    assert_eq!(envelope.procedure, Procedure::Open as i32);
    assert_eq!(envelope.serial, 1);
    assert_eq!(envelope.status, STATUS_ERROR);
    assert_eq!(error_record(&ret).code, code::RPC);
}

#[test]
fn test_unknown_procedure_rejected() {
    let hv = MockHv::default();
    let sasl = MockSasl::default();
    let mut session = make_session(false, AuthType::None);

    let (envelope, ret) = exchange(&hv, &sasl, &mut session, &call_frame(9999, 16, &[]));
    assert_eq!(envelope.status, STATUS_ERROR);
    assert!(error_record(&ret)
        .message
        .as_deref()
        .unwrap()
        .contains("unknown procedure"));
}

#[test]
fn test_close_clears_slot_only_on_success() {
    let sasl = MockSasl::default();

    let hv = MockHv::default();
    let mut session = make_session(false, AuthType::None);
    open_connection(&hv, &sasl, &mut session);
    assert!(session.connection_open());

    let (envelope, _) = exchange(
        &hv,
        &sasl,
        &mut session,
        &call_frame(Procedure::Close as i32, 17, &[]),
    );
    assert_eq!(envelope.status, STATUS_OK);
    assert!(!session.connection_open());
    assert_eq!(hv.calls.borrow().closes, 1);

    // A second close has nothing to close.
    let (envelope, ret) = exchange(
        &hv,
        &sasl,
        &mut session,
        &call_frame(Procedure::Close as i32, 18, &[]),
    );
    assert_eq!(envelope.status, STATUS_ERROR);
    assert_eq!(
        error_record(&ret).message.as_deref(),
        Some("connection not open")
    );

    // A failing close leaves the slot occupied.
    let hv = MockHv {
        fail_close: true,
        ..MockHv::default()
    };
    let mut session = make_session(false, AuthType::None);
    open_connection(&hv, &sasl, &mut session);

    let (envelope, _) = exchange(
        &hv,
        &sasl,
        &mut session,
        &call_frame(Procedure::Close as i32, 19, &[]),
    );
    assert_eq!(envelope.status, STATUS_ERROR);
    assert!(session.connection_open());
}

#[test]
fn test_second_open_rejected() {
    let hv = MockHv::default();
    let sasl = MockSasl::default();
    let mut session = make_session(false, AuthType::None);
    open_connection(&hv, &sasl, &mut session);

    let body = encode(|b| OpenArgs { name: None, flags: 0 }.serialise_into(b).unwrap());
    let (envelope, ret) = exchange(
        &hv,
        &sasl,
        &mut session,
        &call_frame(Procedure::Open as i32, 20, &body),
    );
    assert_eq!(envelope.status, STATUS_ERROR);
    assert_eq!(
        error_record(&ret).message.as_deref(),
        Some("connection already open")
    );
    assert_eq!(hv.calls.borrow().open_flags.len(), 1);
}

// An unboundedly large library string downgrades to a PayloadTooLarge
// error reply; the session survives.
#[test]
fn test_oversize_reply_downgraded_to_error() {
    let hv = MockHv {
        huge_xml: true,
        ..MockHv::default()
    };
    let sasl = MockSasl::default();
    let mut session = make_session(false, AuthType::None);
    open_connection(&hv, &sasl, &mut session);

    let body = encode(|b| {
        proto::DomainFlagsArgs {
            dom: guest_ref(),
            flags: 0,
        }
        .serialise_into(b)
        .unwrap()
    });
    let (envelope, ret) = exchange(
        &hv,
        &sasl,
        &mut session,
        &call_frame(Procedure::DomainGetXmlDesc as i32, 21, &body),
    );
    assert_eq!(envelope.status, STATUS_ERROR);
    assert!(error_record(&ret)
        .message
        .as_deref()
        .unwrap()
        .contains("REMOTE_MESSAGE_MAX"));

    // The session is still usable.
    let (envelope, _) = exchange(
        &hv,
        &sasl,
        &mut session,
        &call_frame(Procedure::GetType as i32, 22, &[]),
    );
    assert_eq!(envelope.status, STATUS_OK);
}

#[test]
fn test_dispatch_without_full_frame_is_fatal() {
    let hv = MockHv::default();
    let sasl = MockSasl::default();
    let mut session = make_session(false, AuthType::None);

    assert_eq!(
        dispatch_request(&hv, &sasl, &mut session).unwrap_err(),
        FatalError::NotReady
    );

    session.append(&[0x00, 0x00]).unwrap();
    assert_eq!(
        dispatch_request(&hv, &sasl, &mut session).unwrap_err(),
        FatalError::NotReady
    );
}

#[test]
fn test_version_and_direction_checks() {
    let hv = MockHv::default();
    let sasl = MockSasl::default();
    let mut session = make_session(false, AuthType::None);

    let mut frame = FrameWriter::new();
    Envelope {
        program: REMOTE_PROGRAM,
        version: REMOTE_PROTOCOL_VERSION + 1,
        procedure: Procedure::GetType as i32,
        direction: DIRECTION_CALL,
        serial: 30,
        status: STATUS_OK,
    }
    .serialise_into(frame.cursor())
    .unwrap();
    let (envelope, ret) = exchange(&hv, &sasl, &mut session, &frame.finish().unwrap());
    assert_eq!(envelope.serial, 30);
    assert!(error_record(&ret)
        .message
        .as_deref()
        .unwrap()
        .contains("version mismatch"));

    let mut frame = FrameWriter::new();
    Envelope {
        program: REMOTE_PROGRAM,
        version: REMOTE_PROTOCOL_VERSION,
        procedure: Procedure::GetType as i32,
        direction: virtrpc::DIRECTION_REPLY,
        serial: 31,
        status: STATUS_OK,
    }
    .serialise_into(frame.cursor())
    .unwrap();
    let (envelope, ret) = exchange(&hv, &sasl, &mut session, &frame.finish().unwrap());
    assert_eq!(envelope.serial, 31);
    assert!(error_record(&ret)
        .message
        .as_deref()
        .unwrap()
        .contains("direction"));
}

// Library failures travel as structured error records, not generic ones.
#[test]
fn test_library_error_forwarded() {
    let hv = MockHv::default();
    let sasl = MockSasl::default();
    let mut session = make_session(false, AuthType::None);
    open_connection(&hv, &sasl, &mut session);

    let body = encode(|b| {
        DomainArgs {
            dom: DomainRef {
                name: "missing-vm".to_owned(),
                uuid: [0xff; 16],
                id: -1,
            },
        }
        .serialise_into(b)
        .unwrap()
    });
    let (envelope, ret) = exchange(
        &hv,
        &sasl,
        &mut session,
        &call_frame(Procedure::DomainSuspend as i32, 32, &body),
    );
    assert_eq!(envelope.status, STATUS_ERROR);
    let rec = error_record(&ret);
    assert_eq!(rec.code, code::NO_DOMAIN);
    assert_eq!(rec.message.as_deref(), Some("domain not found"));
}
